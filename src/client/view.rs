//! Text summary of a rendered state

use std::fmt;

use crate::ws::protocol::WorldSnapshot;

/// What the viewer would draw this frame, condensed
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSummary {
    pub render_time: f64,
    pub own_position: Option<(f64, f64)>,
    pub own_score: Option<u32>,
    pub players: usize,
    pub coins: usize,
    pub leader: Option<(String, u32)>,
}

impl ViewSummary {
    pub fn from_state(state: &WorldSnapshot, player_id: &str) -> Self {
        let own = state.player(player_id);
        let leader = state
            .players
            .iter()
            .max_by_key(|p| p.score)
            .map(|p| (p.id.clone(), p.score));

        Self {
            render_time: state.timestamp,
            own_position: own.map(|p| (p.x, p.y)),
            own_score: own.map(|p| p.score),
            players: state.players.len(),
            coins: state.coins.len(),
            leader,
        }
    }
}

impl fmt::Display for ViewSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.own_position, self.own_score) {
            (Some((x, y)), Some(score)) => write!(f, "you at ({x:.1}, {y:.1}) score {score}")?,
            _ => write!(f, "you are not in view")?,
        }
        write!(f, " | players {} coins {}", self.players, self.coins)?;
        if let Some((id, score)) = &self.leader {
            write!(f, " | leader {id} ({score})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::protocol::MoverSnapshot;

    fn mover(id: &str, score: u32) -> MoverSnapshot {
        MoverSnapshot {
            id: id.into(),
            x: 10.0,
            y: 20.0,
            vx: 0.0,
            vy: 0.0,
            score,
            color: [0, 0, 0],
            radius: 20.0,
        }
    }

    #[test]
    fn summarises_own_mover_and_leader() {
        let state = WorldSnapshot {
            timestamp: 1.0,
            players: vec![mover("me", 2), mover("them", 9)],
            coins: Vec::new(),
        };

        let view = ViewSummary::from_state(&state, "me");

        assert_eq!(view.own_position, Some((10.0, 20.0)));
        assert_eq!(view.own_score, Some(2));
        assert_eq!(view.leader, Some(("them".to_string(), 9)));
        assert_eq!(
            view.to_string(),
            "you at (10.0, 20.0) score 2 | players 2 coins 0 | leader them (9)"
        );
    }

    #[test]
    fn missing_self() {
        let view = ViewSummary::from_state(&WorldSnapshot::empty(0.0), "me");
        assert_eq!(view.to_string(), "you are not in view | players 0 coins 0");
    }
}
