//! Model snapshot persistence (MessagePack).

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{agent::QLearningAgent, q_table::QTable};
use crate::{
    Error, Result,
    game::{Move, StateKey},
    training::OpponentKind,
};

pub const DEFAULT_TRAINING_METHOD: &str = "3-phase-q-learning-curriculum";

/// One stored value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QEntry {
    pub state: StateKey,
    /// Move in the canonical frame of `state`
    pub action: Move,
    pub value: f64,
    /// Updates applied so far; sets the step size of further training
    pub visits: u32,
}

/// Caller-supplied description of how a model was trained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub training_method: String,
    pub is_perfect: bool,
    pub trained_against: Vec<OpponentKind>,
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            training_method: DEFAULT_TRAINING_METHOD.to_string(),
            is_perfect: false,
            trained_against: Vec::new(),
        }
    }
}

/// Everything in a snapshot except the values themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub version: u32,
    pub training_method: String,
    pub is_perfect: bool,
    pub board_size: usize,
    pub q_table_size: usize,
    /// Unix seconds at save time
    pub timestamp: u64,
    pub trained_against: Vec<OpponentKind>,
    pub learning_rate: f64,
    pub discount_factor: f64,
}

/// On-disk model: a flat value table plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedModel {
    pub version: u32,
    pub training_method: String,
    pub is_perfect: bool,
    pub board_size: usize,
    pub q_table_size: usize,
    pub timestamp: u64,
    pub trained_against: Vec<OpponentKind>,
    pub learning_rate: f64,
    pub discount_factor: f64,
    pub entries: Vec<QEntry>,
}

impl SavedModel {
    pub const VERSION: u32 = 2;

    /// Capture `agent`'s table. Entries are sorted so equal tables encode to
    /// equal bytes.
    pub fn from_agent(agent: &QLearningAgent, metadata: ModelMetadata) -> Self {
        let table = agent.table();
        let mut entries: Vec<QEntry> = table
            .entries_with_visits()
            .map(|(state, action, value, visits)| QEntry {
                state: state.clone(),
                action,
                value,
                visits,
            })
            .collect();
        entries.sort_by(|a, b| (&a.state, a.action).cmp(&(&b.state, b.action)));

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            version: Self::VERSION,
            training_method: metadata.training_method,
            is_perfect: metadata.is_perfect,
            board_size: agent.board_size(),
            q_table_size: entries.len(),
            timestamp,
            trained_against: metadata.trained_against,
            learning_rate: table.learning_rate(),
            discount_factor: table.discount_factor(),
            entries,
        }
    }

    pub fn info(&self) -> SnapshotInfo {
        SnapshotInfo {
            version: self.version,
            training_method: self.training_method.clone(),
            is_perfect: self.is_perfect,
            board_size: self.board_size,
            q_table_size: self.q_table_size,
            timestamp: self.timestamp,
            trained_against: self.trained_against.clone(),
            learning_rate: self.learning_rate,
            discount_factor: self.discount_factor,
        }
    }

    /// Reject snapshots this build cannot use for a `board_size` agent.
    pub fn validate(&self, board_size: usize) -> Result<()> {
        if self.version != Self::VERSION {
            return Err(Error::UnsupportedVersion {
                found: self.version,
                expected: Self::VERSION,
            });
        }
        if self.board_size != board_size {
            return Err(Error::BoardSizeMismatch {
                found: self.board_size,
                expected: board_size,
            });
        }
        if let Some(entry) = self.entries.iter().find(|e| e.state.size() != board_size) {
            return Err(Error::BoardSizeMismatch {
                found: entry.state.size(),
                expected: board_size,
            });
        }
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| Error::io(format!("create snapshot file {}", path.display()), e))?;
        let mut writer = BufWriter::new(file);
        rmp_serde::encode::write(&mut writer, self)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::io(format!("open snapshot file {}", path.display()), e))?;
        let reader = BufReader::new(file);
        Ok(rmp_serde::decode::from_read(reader)?)
    }

    fn into_table(self) -> QTable {
        let mut table = QTable::new(self.learning_rate, self.discount_factor);
        table.extend(
            self.entries
                .into_iter()
                .map(|entry| (entry.state, entry.action, entry.value, entry.visits)),
        );
        table
    }
}

impl QLearningAgent {
    pub fn save_snapshot<P: AsRef<Path>>(&self, path: P, metadata: ModelMetadata) -> Result<SnapshotInfo> {
        let model = SavedModel::from_agent(self, metadata);
        model.save_to_file(&path)?;
        info!(
            path = %path.as_ref().display(),
            entries = model.q_table_size,
            is_perfect = model.is_perfect,
            "saved model snapshot"
        );
        Ok(model.info())
    }

    /// Replace the value table with the one stored at `path`.
    ///
    /// On any failure the table is left empty and the error is returned;
    /// the agent stays usable.
    pub fn load_snapshot<P: AsRef<Path>>(&mut self, path: P) -> Result<SnapshotInfo> {
        let path = path.as_ref();
        let loaded = SavedModel::load_from_file(path).and_then(|model| {
            model.validate(self.board_size())?;
            Ok(model)
        });

        match loaded {
            Ok(model) => {
                let info = model.info();
                self.table = model.into_table();
                info!(path = %path.display(), entries = info.q_table_size, "loaded model snapshot");
                Ok(info)
            }
            Err(err) => {
                self.table.reset();
                warn!(path = %path.display(), error = %err, "model snapshot not loaded, starting empty");
                Err(err)
            }
        }
    }

    /// Build an agent straight from a snapshot file.
    pub fn from_snapshot<P: AsRef<Path>>(path: P) -> Result<(Self, SnapshotInfo)> {
        let model = SavedModel::load_from_file(path)?;
        let mut agent = QLearningAgent::default().with_board_size(model.board_size);
        model.validate(agent.board_size())?;
        let info = model.info();
        agent.table = model.into_table();
        Ok((agent, info))
    }
}
