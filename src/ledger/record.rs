//! Ledger rows and backend wire records.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::{Competition, Role, Seat, SeatMap, Team, Timestamp};
use crate::game::EndReason;

/// One finished game as recorded by this validator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub room_id: String,
    pub competition: Competition,
    /// Hotkey per seat; local seats carry the validator's own hotkey.
    pub hotkeys: SeatMap<String>,
    pub scores: SeatMap<f64>,
    pub winner: Option<Team>,
    pub started_at: Timestamp,
    pub ended_at: Timestamp,
    pub reason: Option<EndReason>,
    /// Set once the backend accepted the record.
    pub synced_at: Option<Timestamp>,
}

/// Per-hotkey totals over a window.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WindowAggregate {
    pub count: u64,
    pub sum: f64,
}

impl WindowAggregate {
    #[must_use]
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

// === Wire records ===

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeatScore {
    #[serde(default)]
    pub hotkey: String,
    #[serde(default)]
    pub score: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeamScores {
    pub spymaster: SeatScore,
    pub operative: SeatScore,
}

impl TeamScores {
    fn seat(&self, role: Role) -> &SeatScore {
        match role {
            Role::Spymaster => &self.spymaster,
            Role::Operative => &self.operative,
        }
    }
}

fn team_scores(record: &ScoreRecord, team: Team) -> TeamScores {
    let seat = |role| {
        let seat = Seat::new(team, role);
        SeatScore {
            hotkey: record.hotkeys[seat].clone(),
            score: record.scores[seat],
        }
    };
    TeamScores {
        spymaster: seat(Role::Spymaster),
        operative: seat(Role::Operative),
    }
}

/// Body of `PATCH /scores/{room_id}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PushPayload {
    pub competition: Competition,
    pub red: TeamScores,
    pub blue: TeamScores,
    pub winner: Option<Team>,
    pub reason: Option<EndReason>,
    pub started_at: Timestamp,
    pub ended_at: Timestamp,
}

impl From<&ScoreRecord> for PushPayload {
    fn from(record: &ScoreRecord) -> Self {
        Self {
            competition: record.competition,
            red: team_scores(record, Team::Red),
            blue: team_scores(record, Team::Blue),
            winner: record.winner,
            reason: record.reason,
            started_at: record.started_at,
            ended_at: record.ended_at,
        }
    }
}

/// One canonical ledger entry from `GET /scores/sync`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyncRow {
    /// Backend record id; the pull cursor follows it.
    pub id: i64,
    pub room_id: String,
    pub competition: Competition,
    /// Hotkey of the validator that submitted the game.
    #[serde(default)]
    pub validator: String,
    pub red: TeamScores,
    pub blue: TeamScores,
    #[serde(default)]
    pub winner: Option<Team>,
    #[serde(default)]
    pub reason: Option<EndReason>,
    #[serde(default)]
    pub started_at: Timestamp,
    pub ended_at: Timestamp,
}

impl SyncRow {
    /// Hotkey and score at `seat`.
    #[must_use]
    pub fn seat(&self, seat: Seat) -> &SeatScore {
        let team = match seat.team {
            Team::Red => &self.red,
            Team::Blue => &self.blue,
        };
        team.seat(seat.role)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMeta {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_since_id: Option<i64>,
}

/// One page of the canonical ledger.
///
/// Rows are decoded one at a time. A row that does not decode (unknown
/// competition, missing fields) is dropped with a warning and the rest of
/// the page is kept. When the backend sends no `next_since_id`, the dropped
/// rows' ids still count towards the cursor so the pull moves past them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSyncPage")]
pub struct SyncPage {
    pub data: Vec<SyncRow>,
    pub meta: SyncMeta,
}

#[derive(Deserialize)]
struct RawSyncPage {
    #[serde(default)]
    data: Vec<serde_json::Value>,
    #[serde(default)]
    meta: SyncMeta,
}

impl From<RawSyncPage> for SyncPage {
    fn from(raw: RawSyncPage) -> Self {
        let mut data = Vec::with_capacity(raw.data.len());
        let mut skipped_max: Option<i64> = None;
        for value in raw.data {
            let id = value.get("id").and_then(serde_json::Value::as_i64);
            match serde_json::from_value::<SyncRow>(value) {
                Ok(row) => data.push(row),
                Err(err) => {
                    warn!(id = ?id, error = %err, "dropping undecodable sync row");
                    skipped_max = skipped_max.max(id);
                }
            }
        }

        let mut meta = raw.meta;
        if meta.next_since_id.is_none() && skipped_max.is_some() {
            meta.next_since_id = data.iter().map(|r| r.id).max().max(skipped_max);
        }
        Self { data, meta }
    }
}

impl SyncPage {
    /// Cursor after applying this page: `next_since_id`, else the highest row id.
    #[must_use]
    pub fn next_cursor(&self) -> Option<i64> {
        self.meta
            .next_since_id
            .or_else(|| self.data.iter().map(|r| r.id).max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ScoreRecord {
        ScoreRecord {
            room_id: "room-1".into(),
            competition: Competition::ClueCompetition,
            hotkeys: SeatMap::from_array(["a".into(), "v".into(), "b".into(), "v".into()]),
            scores: SeatMap::from_array([1.0, 1.0, 0.0, 0.0]),
            winner: Some(Team::Red),
            started_at: 100,
            ended_at: 200,
            reason: Some(EndReason::Assassin),
            synced_at: None,
        }
    }

    #[test]
    fn test_push_payload_shape() {
        let json = serde_json::to_value(PushPayload::from(&record())).unwrap();
        assert_eq!(json["red"]["spymaster"]["hotkey"], "a");
        assert_eq!(json["blue"]["spymaster"]["score"], 0.0);
        assert_eq!(json["reason"], "assassin");
        assert_eq!(json["competition"], "clue_competition");
    }

    #[test]
    fn test_sync_page_parse() {
        let json = r#"{
            "data": [{
                "id": 7, "room_id": "r", "competition": "guess_competition",
                "validator": "v",
                "red": {"spymaster": {"hotkey": "v", "score": 0.0},
                        "operative": {"hotkey": "a", "score": 0.0}},
                "blue": {"spymaster": {"hotkey": "v", "score": 1.0},
                         "operative": {"hotkey": "b", "score": 1.0}},
                "winner": "blue", "reason": "all_revealed", "ended_at": 50
            }],
            "meta": {"count": 1, "total": 3, "has_more": true, "next_since_id": 7}
        }"#;
        let page: SyncPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.data[0].seat(Seat::BLUE_OPERATIVE).hotkey, "b");
        assert_eq!(page.next_cursor(), Some(7));
        assert!(page.meta.has_more);
    }

    #[test]
    fn test_next_cursor_falls_back_to_max_id() {
        let mut page: SyncPage = serde_json::from_str(r#"{"data": [], "meta": {}}"#).unwrap();
        assert_eq!(page.next_cursor(), None);

        let row: SyncRow = serde_json::from_value(serde_json::json!({
            "id": 12, "room_id": "x", "competition": "clue_competition",
            "red": {"spymaster": {}, "operative": {}},
            "blue": {"spymaster": {}, "operative": {}},
            "ended_at": 1
        }))
        .unwrap();
        page.data.push(row);
        assert_eq!(page.next_cursor(), Some(12));
    }

    #[test]
    fn test_bad_row_dropped_rest_of_page_kept() {
        let json = r#"{
            "data": [
                {"id": 8, "room_id": "other", "competition": "chess_competition",
                 "red": {"spymaster": {}, "operative": {}},
                 "blue": {"spymaster": {}, "operative": {}}, "ended_at": 1},
                {"id": 9, "room_id": "ok", "competition": "clue_competition",
                 "red": {"spymaster": {}, "operative": {}},
                 "blue": {"spymaster": {}, "operative": {}}, "ended_at": 2},
                {"id": 10, "room_id": "broken", "competition": "clue_competition"}
            ],
            "meta": {"has_more": true, "next_since_id": 10}
        }"#;
        let page: SyncPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].room_id, "ok");
        assert_eq!(page.next_cursor(), Some(10));
    }

    #[test]
    fn test_bad_last_row_still_moves_cursor() {
        let json = r#"{
            "data": [
                {"id": 3, "room_id": "ok", "competition": "guess_competition",
                 "red": {"spymaster": {}, "operative": {}},
                 "blue": {"spymaster": {}, "operative": {}}, "ended_at": 2},
                {"id": 12, "room_id": "x", "competition": 7}
            ],
            "meta": {"has_more": false}
        }"#;
        let page: SyncPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.next_cursor(), Some(12));
    }

    #[test]
    fn test_window_average() {
        let agg = WindowAggregate { count: 4, sum: 3.0 };
        assert_eq!(agg.average(), 0.75);
        assert_eq!(WindowAggregate::default().average(), 0.0);
    }
}
