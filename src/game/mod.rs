//! Game coordinator: the per-room phase state machine.
//!
//! Phases progress lobby → countdown → question → results → (countdown |
//! podium) → leaderboard → lobby. Every transition happens inside the room's
//! critical section; timers are spawned tasks that carry only the room code
//! and a generation number, re-lock the room when they fire, and abort when
//! the generation has moved on. Cancellation is therefore just bumping the
//! generation.

pub mod scoring;


use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::protocol::{
    GameError, MemberId, MemberView, Phase, RankingEntry, Role, ServerFrame,
};
use crate::registry::RoomRegistry;
use crate::room::Room;

/// Who issued a command: a socket member (role-checked) or the trusted
/// admin HTTP surface.
#[derive(Debug, Clone, Copy)]
pub enum Actor {
    Member(MemberId),
    System,
}

/// The chosen option of an accepted answer, or the timeout marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerChoice {
    Option(u8),
    Timeout,
}

/// Immutable record of one accepted answer. Created on acceptance, never
/// mutated.
#[derive(Debug, Clone, Copy)]
pub struct AnswerRecord {
    pub choice: AnswerChoice,
    /// Logical timestamp assigned on acceptance.
    pub logical_ts: u64,
    /// Server-measured time since question emission.
    pub elapsed_ms: u64,
    /// Points this answer is worth; applied to the score at question close.
    pub points: u32,
}

/// Mutable per-session state owned by a room.
#[derive(Debug, Default)]
pub struct GameState {
    pub phase: Phase,
    pub question_index: usize,
    /// When the open question was emitted; `None` outside the question phase.
    pub opened_at: Option<Instant>,
    /// Accepted answers for the open question, keyed by member.
    pub answers: HashMap<MemberId, AnswerRecord>,
    /// Generation counter for timers; stale callbacks compare and abort.
    pub timer_gen: u64,
    /// Ranking frozen at podium entry so the reveal is deterministic.
    pub final_ranking: Vec<RankingEntry>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate every outstanding timer and return the new generation.
    pub fn bump_timer(&mut self) -> u64 {
        self.timer_gen += 1;
        self.timer_gen
    }
}

// ---------------------------------------------------------------------------
// Administrator commands
// ---------------------------------------------------------------------------

/// lobby → countdown. Requires at least one player and one question;
/// everyone present plays this session.
pub async fn start_game(
    registry: &Arc<RoomRegistry>,
    code: &str,
    actor: Actor,
) -> Result<(), GameError> {
    let shared = registry.find(code).await.ok_or(GameError::RoomNotFound)?;
    let mut room = shared.lock().await;
    require_admin(&room, actor)?;
    if room.game.phase != Phase::Lobby {
        return Err(GameError::phase_violation(
            "A game is already in progress",
        ));
    }
    if room.questions.count() == 0 {
        return Err(GameError::phase_violation(
            "Add at least one question before starting",
        ));
    }
    if room.members.iter().filter(|m| m.role == Role::Player).count() == 0 {
        return Err(GameError::phase_violation(
            "At least one player is needed to start",
        ));
    }

    for member in room.members.iter_mut() {
        member.waiting = false;
    }
    room.game.question_index = 0;
    room.game.answers.clear();
    room.game.final_ranking.clear();

    tracing::info!(room_code = %room.code(), "Game starting");
    enter_countdown(&mut room, registry);
    Ok(())
}

/// results → countdown (more questions) or results → podium (last one).
pub async fn advance(
    registry: &Arc<RoomRegistry>,
    code: &str,
    actor: Actor,
) -> Result<(), GameError> {
    let shared = registry.find(code).await.ok_or(GameError::RoomNotFound)?;
    let mut room = shared.lock().await;
    require_admin(&room, actor)?;
    if room.game.phase != Phase::Results {
        return Err(GameError::phase_violation(
            "next is only allowed on the results screen",
        ));
    }

    if room.game.question_index + 1 < room.questions.count() {
        room.game.question_index += 1;
        enter_countdown(&mut room, registry);
    } else {
        enter_podium(&mut room, registry);
    }
    Ok(())
}

/// Skip the (rest of the) podium reveal and show the leaderboard.
pub async fn show_leaderboard(
    registry: &Arc<RoomRegistry>,
    code: &str,
    actor: Actor,
) -> Result<(), GameError> {
    let shared = registry.find(code).await.ok_or(GameError::RoomNotFound)?;
    let mut room = shared.lock().await;
    require_admin(&room, actor)?;
    match room.game.phase {
        Phase::Podium => {
            finish_podium(&mut room);
            Ok(())
        }
        Phase::Results if room.game.question_index + 1 >= room.questions.count() => {
            room.game.final_ranking = scoring::ranking(&room.members);
            finish_podium(&mut room);
            Ok(())
        }
        _ => Err(GameError::phase_violation(
            "The leaderboard is only available after the final results",
        )),
    }
}

/// any → lobby. Cancels every timer and pending podium step; members keep
/// their seats, scores reset.
pub async fn end_game(
    registry: &Arc<RoomRegistry>,
    code: &str,
    actor: Actor,
) -> Result<(), GameError> {
    let shared = registry.find(code).await.ok_or(GameError::RoomNotFound)?;
    let mut room = shared.lock().await;
    require_admin(&room, actor)?;
    tracing::info!(room_code = %room.code(), phase = %room.game.phase, "Game ended by administrator");
    reset_session(&mut room);
    Ok(())
}

/// leaderboard → lobby for the next session.
pub async fn back_to_lobby(
    registry: &Arc<RoomRegistry>,
    code: &str,
    actor: Actor,
) -> Result<(), GameError> {
    let shared = registry.find(code).await.ok_or(GameError::RoomNotFound)?;
    let mut room = shared.lock().await;
    require_admin(&room, actor)?;
    if room.game.phase != Phase::Leaderboard {
        return Err(GameError::phase_violation(
            "back to lobby is only allowed from the leaderboard",
        ));
    }
    reset_session(&mut room);
    Ok(())
}

// ---------------------------------------------------------------------------
// Player input
// ---------------------------------------------------------------------------

/// Accept or reject an answer for the open question.
///
/// Accepted iff the phase is `question`, the member is a connected,
/// non-waiting player, has not answered yet, and the choice is in range.
/// The client timestamp only advances the logical clock.
pub async fn submit_answer(
    registry: &Arc<RoomRegistry>,
    code: &str,
    member_id: MemberId,
    choice: u8,
    client_ts: u64,
) -> Result<(), GameError> {
    let shared = registry.find(code).await.ok_or(GameError::RoomNotFound)?;
    let mut room = shared.lock().await;

    if room.game.phase != Phase::Question {
        return Err(GameError::phase_violation("There is no open question"));
    }
    let question = room
        .questions
        .get(room.game.question_index)
        .cloned()
        .ok_or_else(|| GameError::phase_violation("There is no open question"))?;

    let member = room.members.find(member_id).ok_or(GameError::NotConnected)?;
    if member.role != Role::Player {
        return Err(GameError::not_authorized("Only players can answer"));
    }
    if member.waiting {
        return Err(GameError::not_authorized(
            "You are waiting for the next game",
        ));
    }
    if member.conn.is_none() {
        return Err(GameError::NotConnected);
    }
    if usize::from(choice) >= question.options.len() {
        return Err(GameError::OptionOutOfRange);
    }
    if room.game.answers.contains_key(&member_id) {
        return Err(GameError::AlreadyAnswered);
    }

    let deadline_ms = question.time_limit * 1000;
    let elapsed_ms = room
        .game
        .opened_at
        .map(|t| t.elapsed().as_millis() as u64)
        .unwrap_or(u64::MAX);
    if elapsed_ms > deadline_ms {
        // The deadline passed before its timer ran; close now, the member
        // goes down the timeout path.
        close_question(&mut room);
        return Ok(());
    }

    let logical_ts = room.clock.observe(client_ts);
    let points = if choice == question.correct {
        scoring::score_answer(elapsed_ms, deadline_ms)
    } else {
        0
    };
    room.game.answers.insert(
        member_id,
        AnswerRecord {
            choice: AnswerChoice::Option(choice),
            logical_ts,
            elapsed_ms,
            points,
        },
    );

    let answered = answered_active_count(&room);
    let total = room.members.active_player_count();
    room.emit(&ServerFrame::PlayerAnswered { answered, total });
    tracing::debug!(
        room_code = %room.code(),
        %member_id,
        choice,
        elapsed_ms,
        answered,
        total,
        "Answer accepted"
    );

    if answered >= total {
        close_question(&mut room);
    }
    Ok(())
}

/// Coordinator input for member departures: a question whose remaining
/// active players have all answered collapses immediately.
pub fn handle_departure(room: &mut Room) {
    if room.game.phase == Phase::Question
        && room.members.active_player_count() > 0
        && answered_active_count(room) >= room.members.active_player_count()
    {
        close_question(room);
    }
}

// ---------------------------------------------------------------------------
// Transitions (room lock held)
// ---------------------------------------------------------------------------

fn enter_countdown(room: &mut Room, registry: &Arc<RoomRegistry>) {
    room.game.phase = Phase::Countdown;
    let seconds = room.config().game.countdown_secs;
    let delay = room.config().game.countdown();
    room.emit(&ServerFrame::Countdown { seconds });
    let gen = room.game.bump_timer();
    spawn_timer(registry.clone(), room.code().to_string(), gen, delay, TimerKind::Countdown);
}

fn open_question(room: &mut Room, registry: &Arc<RoomRegistry>) {
    let index = room.game.question_index;
    let total = room.questions.count();
    let Some(question) = room.questions.get(index).cloned() else {
        tracing::error!(room_code = %room.code(), index, "Question bank shrank mid-session");
        reset_session(room);
        return;
    };

    room.game.phase = Phase::Question;
    room.game.answers.clear();
    room.game.opened_at = Some(Instant::now());

    // Waiting members receive snapshots only, never the live question.
    let excluded = room.waiting_member_conns();
    let view = question.view();
    room.emit_stamped_except(&excluded, |ts| ServerFrame::Question {
        question: view,
        number: index + 1,
        total,
        timestamp: ts,
    });

    let gen = room.game.bump_timer();
    spawn_timer(
        registry.clone(),
        room.code().to_string(),
        gen,
        Duration::from_secs(question.time_limit),
        TimerKind::QuestionDeadline,
    );
}

/// question → results: mark absentees as timeouts, apply awards, publish
/// per-question results. Also cancels the deadline timer.
fn close_question(room: &mut Room) {
    let Some(question) = room.questions.get(room.game.question_index).cloned() else {
        return;
    };
    let deadline_ms = question.time_limit * 1000;

    let absent: Vec<MemberId> = room
        .members
        .iter()
        .filter(|m| m.is_active_player() && !room.game.answers.contains_key(&m.id))
        .map(|m| m.id)
        .collect();
    for member_id in absent {
        let logical_ts = room.clock.tick();
        room.game.answers.insert(
            member_id,
            AnswerRecord {
                choice: AnswerChoice::Timeout,
                logical_ts,
                elapsed_ms: deadline_ms,
                points: 0,
            },
        );
    }

    let actives: Vec<MemberId> = room
        .members
        .iter()
        .filter(|m| m.is_active_player())
        .map(|m| m.id)
        .collect();
    for member_id in actives {
        let (points, logical_ts) = room
            .game
            .answers
            .get(&member_id)
            .map(|r| (r.points, r.logical_ts))
            .unwrap_or((0, 0));
        room.members.add_score(member_id, points);
        if points > 0 {
            if let Some(member) = room.members.find_mut(member_id) {
                member.last_award_ts = Some(logical_ts);
            }
        }
    }

    let stats = scoring::option_stats(&room.game.answers);
    let ranking = scoring::ranking(&room.members);
    room.game.phase = Phase::Results;
    room.game.opened_at = None;
    room.game.bump_timer();
    room.emit(&ServerFrame::Results {
        ranking,
        correct: question.correct,
        stats,
    });
}

fn enter_podium(room: &mut Room, registry: &Arc<RoomRegistry>) {
    room.game.phase = Phase::Podium;
    room.game.final_ranking = scoring::ranking(&room.members);
    room.emit(&ServerFrame::PodiumStart);
    let gen = room.game.bump_timer();
    let top = room.game.final_ranking.len().min(3);
    spawn_podium_reveal(registry.clone(), room.code().to_string(), gen, top);
}

/// podium → leaderboard with the full final ranking.
fn finish_podium(room: &mut Room) {
    room.game.phase = Phase::Leaderboard;
    room.game.bump_timer();
    let ranking = room.game.final_ranking.clone();
    room.emit(&ServerFrame::PodiumComplete { ranking });
}

/// Back to the lobby: cancel timers, reset session data, keep members.
fn reset_session(room: &mut Room) {
    room.game.bump_timer();
    room.game.phase = Phase::Lobby;
    room.game.question_index = 0;
    room.game.answers.clear();
    room.game.opened_at = None;
    room.game.final_ranking.clear();
    room.members.reset_scores();
    let members = room.members.snapshot();
    room.emit(&ServerFrame::GameEnded { members });
}

// ---------------------------------------------------------------------------
// Timers
// ---------------------------------------------------------------------------

enum TimerKind {
    Countdown,
    QuestionDeadline,
}

/// One-shot phase timer. Carries only the room code and a generation; a
/// firing that finds either gone or moved on is a no-op.
fn spawn_timer(
    registry: Arc<RoomRegistry>,
    code: String,
    gen: u64,
    delay: Duration,
    kind: TimerKind,
) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let Some(shared) = registry.find(&code).await else {
            return;
        };
        let mut room = shared.lock().await;
        if room.game.timer_gen != gen {
            return;
        }
        match kind {
            TimerKind::Countdown => {
                if room.game.phase == Phase::Countdown {
                    open_question(&mut room, &registry);
                }
            }
            TimerKind::QuestionDeadline => {
                if room.game.phase == Phase::Question {
                    tracing::debug!(room_code = %room.code(), "Question deadline reached");
                    close_question(&mut room);
                }
            }
        }
    });
}

/// Server-driven podium pacing: reveal ranks bottom-up (at most the top
/// three), then publish the complete ranking. Each step re-checks the
/// generation, so an administrator `end` cancels the remainder.
fn spawn_podium_reveal(registry: Arc<RoomRegistry>, code: String, gen: u64, top: usize) {
    tokio::spawn(async move {
        let (step, finale) = {
            let Some(shared) = registry.find(&code).await else {
                return;
            };
            let room = shared.lock().await;
            (room.config().game.podium_step(), room.config().game.podium_finale())
        };

        for position in (1..=top).rev() {
            tokio::time::sleep(step).await;
            let Some(shared) = registry.find(&code).await else {
                return;
            };
            let mut room = shared.lock().await;
            if room.game.timer_gen != gen || room.game.phase != Phase::Podium {
                return;
            }
            let Some(entry) = room.game.final_ranking.get(position - 1).cloned() else {
                continue;
            };
            let member = room
                .members
                .find(entry.member_id)
                .map(|m| m.view())
                .unwrap_or_else(|| departed_member_view(&entry));
            room.emit(&ServerFrame::PodiumPosition { position, member });
        }

        tokio::time::sleep(finale).await;
        let Some(shared) = registry.find(&code).await else {
            return;
        };
        let mut room = shared.lock().await;
        if room.game.timer_gen != gen || room.game.phase != Phase::Podium {
            return;
        }
        finish_podium(&mut room);
    });
}

/// View for a podium entry whose member left before the reveal.
fn departed_member_view(entry: &RankingEntry) -> MemberView {
    MemberView {
        id: entry.member_id,
        name: entry.name.clone(),
        role: Role::Player,
        score: entry.score,
        waiting: false,
        connected: false,
        last_delta: entry.delta,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn require_admin(room: &Room, actor: Actor) -> Result<(), GameError> {
    match actor {
        Actor::System => Ok(()),
        Actor::Member(member_id) => {
            let member = room.members.find(member_id).ok_or(GameError::NotConnected)?;
            if member.role.is_admin() {
                Ok(())
            } else {
                Err(GameError::not_authorized(
                    "Only the administrator can do that",
                ))
            }
        }
    }
}

/// Active players with an accepted answer for the open question.
fn answered_active_count(room: &Room) -> usize {
    room.members
        .iter()
        .filter(|m| m.is_active_player() && room.game.answers.contains_key(&m.id))
        .count()
}
