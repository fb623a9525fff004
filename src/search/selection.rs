//! Bookkeeping for the candidate that will become the output

use std::io;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::model::Candidate;

/// A serialized candidate on disk; the file is deleted when dropped
#[derive(Debug)]
pub struct Artifact {
    file: NamedTempFile,
    pub size: u64,
}

impl Artifact {
    /// Wrap a fully written temporary file, measuring its size
    pub fn new(file: NamedTempFile) -> io::Result<Self> {
        let size = file.as_file().metadata()?.len();
        Ok(Self { file, size })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Move the file to `path`, replacing anything already there
    pub fn persist(self, path: &Path) -> io::Result<()> {
        self.file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct Selected {
    pub candidate: Candidate,
    pub artifact: Artifact,
}

/// Best candidate seen so far under a byte budget
#[derive(Debug)]
pub struct Selection {
    target: u64,
    best: Option<Selected>,
}

impl Selection {
    pub fn new(target: u64) -> Self {
        Self { target, best: None }
    }

    pub fn target(&self) -> u64 {
        self.target
    }

    /// Record `artifact` if it meets the budget and beats the current best.
    ///
    /// Ties keep the earlier candidate. A rejected artifact is dropped, which
    /// deletes its file. Returns whether it was kept.
    pub fn offer(&mut self, candidate: Candidate, artifact: Artifact) -> bool {
        if artifact.size > self.target {
            return false;
        }
        let better = match &self.best {
            None => true,
            Some(best) => artifact.size < best.artifact.size,
        };
        if better {
            self.best = Some(Selected {
                candidate,
                artifact,
            });
        }
        better
    }

    pub fn is_found(&self) -> bool {
        self.best.is_some()
    }

    pub fn into_selected(self) -> Option<Selected> {
        self.best
    }
}
