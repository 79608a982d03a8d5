//! Answer scoring and ranking.
//!
//! A correct answer is worth `1000 × (1 − 0.5 × elapsed/deadline)` rounded
//! to the nearest integer. Elapsed time is server-measured from question
//! emission to answer acceptance; client timestamps only ever advance the
//! logical clock.

use std::collections::HashMap;

use crate::protocol::{MemberId, RankingEntry, OPTION_COUNT};
use crate::room::members::{Member, MemberRegistry};

use super::{AnswerChoice, AnswerRecord};

/// Points for a correct answer after `elapsed_ms` of a `deadline_ms` window.
/// Answers past the deadline take the timeout path and score nothing.
pub fn score_answer(elapsed_ms: u64, deadline_ms: u64) -> u32 {
    if deadline_ms == 0 || elapsed_ms > deadline_ms {
        return 0;
    }
    let fraction = elapsed_ms as f64 / deadline_ms as f64;
    let raw = 1000.0 * (1.0 - 0.5 * fraction);
    raw.round().max(0.0) as u32
}

/// Current ranking of the session's active players, best first.
///
/// Ties break by lower logical timestamp of the latest awarded answer, then
/// by earlier join order. Waiting members and the administrator are not
/// ranked.
pub fn ranking(members: &MemberRegistry) -> Vec<RankingEntry> {
    let mut players: Vec<&Member> = members.iter().filter(|m| m.is_active_player()).collect();
    players.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| award_ts(a).cmp(&award_ts(b)))
            .then_with(|| a.joined_seq.cmp(&b.joined_seq))
    });
    players
        .into_iter()
        .enumerate()
        .map(|(i, m)| RankingEntry {
            position: i + 1,
            member_id: m.id,
            name: m.name.clone(),
            score: m.score,
            delta: m.last_delta,
        })
        .collect()
}

fn award_ts(member: &Member) -> u64 {
    member.last_award_ts.unwrap_or(u64::MAX)
}

/// Count of chosen answers per option index. Timeouts are not counted.
pub fn option_stats(answers: &HashMap<MemberId, AnswerRecord>) -> [u32; OPTION_COUNT] {
    let mut stats = [0u32; OPTION_COUNT];
    for record in answers.values() {
        if let AnswerChoice::Option(index) = record.choice {
            if let Some(slot) = stats.get_mut(usize::from(index)) {
                *slot += 1;
            }
        }
    }
    stats
}
