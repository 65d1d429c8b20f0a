//! Reconciles pushed snapshots with locally pending messages

use helpdesk_types::Message;

/// Combine the latest authoritative snapshot with what is on screen
///
/// The result is the snapshot plus every optimistic placeholder that has no
/// authoritative counterpart yet, stably sorted by timestamp. A placeholder is
/// confirmed by any snapshot message with the same content and sender id.
///
/// When nothing is displayed yet the snapshot is returned untouched, in server
/// order, so a first load is never treated as a merge.
pub fn merge_snapshot(displayed: &[Message], authoritative: Vec<Message>) -> Vec<Message> {
    if displayed.is_empty() {
        return authoritative;
    }

    let mut merged = authoritative;
    let pending: Vec<Message> = displayed
        .iter()
        .filter(|m| m.is_optimistic)
        .filter(|m| !merged.iter().any(|a| a.same_content(m)))
        .cloned()
        .collect();
    merged.extend(pending);

    sort_by_timestamp(&mut merged);
    merged
}

/// Stable ascending sort; unparseable timestamps go last in arrival order
pub fn sort_by_timestamp(messages: &mut [Message]) {
    messages.sort_by_cached_key(|m| {
        let parsed = m.parsed_timestamp();
        (parsed.is_none(), parsed)
    });
}

/// Newest message in `merged` that was not already on screen
///
/// A snapshot message that merely confirms one of `previous`'s placeholders
/// does not count as an arrival.
pub fn newest_arrival<'a>(previous: &[Message], merged: &'a [Message]) -> Option<&'a Message> {
    merged.iter().rev().find(|candidate| {
        let already_shown = previous.iter().any(|p| p.id == candidate.id);
        let confirms_placeholder = !candidate.is_optimistic
            && previous
                .iter()
                .any(|p| p.is_optimistic && p.same_content(candidate));
        !already_shown && !confirms_placeholder
    })
}

/// Whether an identical placeholder is still waiting for its echo
pub fn has_pending_duplicate(displayed: &[Message], candidate: &Message) -> bool {
    displayed
        .iter()
        .any(|m| m.is_optimistic && m.same_content(candidate))
}
