//! High score provider
//!
//! The driver reports each finished run here exactly once and reads the best
//! score for the HUD. The leaderboard keeps the top 10 and persists itself
//! to LocalStorage; the simulation never touches storage.

use serde::{Deserialize, Serialize};

use crate::catalog::Environment;
use crate::sim::GameMode;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// Outbound report for one finished run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub score: u64,
    pub mode: GameMode,
    pub environment: Environment,
}

/// Long-lived score state owned outside the run
pub trait HighScoreProvider {
    /// Best score so far (0 when empty)
    fn best(&self) -> u64;

    /// Report a finished run; returns true if it set a new best
    fn record(&mut self, summary: RunSummary) -> bool;
}

/// A single high score entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    pub mode: GameMode,
    pub environment: Environment,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "rd_highest";

    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score makes the board
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Insert a score, keeping the board sorted descending.
    /// Returns the 1-indexed rank, or None if it didn't qualify
    pub fn add_score(&mut self, summary: RunSummary, timestamp: f64) -> Option<usize> {
        if !self.qualifies(summary.score) {
            return None;
        }

        let entry = HighScoreEntry {
            score: summary.score,
            mode: summary.mode,
            environment: summary.environment,
            timestamp,
        };

        let rank = match self.entries.iter().position(|e| summary.score > e.score) {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };
        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Load high scores from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str::<HighScores>(&json) {
                    Ok(scores) => {
                        log::info!("Loaded {} high scores", scores.entries.len());
                        return scores;
                    }
                    Err(e) => log::warn!("Discarding unreadable high scores: {}", e),
                }
            }
        }

        log::info!("No high scores found, starting fresh");
        Self::new()
    }

    /// Save high scores to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("High scores saved ({} entries)", self.entries.len());
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {}
}

#[cfg(target_arch = "wasm32")]
fn now_timestamp() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
fn now_timestamp() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

impl HighScoreProvider for HighScores {
    fn best(&self) -> u64 {
        self.top_score().unwrap_or(0)
    }

    fn record(&mut self, summary: RunSummary) -> bool {
        let previous = self.best();
        if let Some(rank) = self.add_score(summary, now_timestamp()) {
            log::info!("Score {} placed #{} on the leaderboard", summary.score, rank);
            self.save();
        }
        summary.score > previous
    }
}

/// In-memory provider that remembers every report
#[derive(Debug, Clone, Default)]
pub struct MemoryHighScores {
    pub best: u64,
    pub reports: Vec<RunSummary>,
}

impl MemoryHighScores {
    pub fn with_best(best: u64) -> Self {
        Self {
            best,
            reports: Vec::new(),
        }
    }
}

impl HighScoreProvider for MemoryHighScores {
    fn best(&self) -> u64 {
        self.best
    }

    fn record(&mut self, summary: RunSummary) -> bool {
        self.reports.push(summary);
        if summary.score > self.best {
            self.best = summary.score;
            true
        } else {
            false
        }
    }
}
