//! Deferred command queue
//!
//! The UI pushes [`Command`]s while it builds its frame; the viewer drains
//! the queue once per frame, after the UI update and before rendering.

use std::path::PathBuf;

/// An intent issued by the UI. Commands are plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Import a model file and replace the loaded models with it
    LoadModel { path: PathBuf },
}

#[derive(Debug, Default)]
pub struct CommandQueue {
    commands: Vec<Command>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        log::debug!("Queued {:?}", command);
        self.commands.push(command);
    }

    /// Remove and return every queued command in submission order
    pub fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_drains_in_order() {
        let mut queue = CommandQueue::new();
        queue.push(Command::LoadModel { path: "a.obj".into() });
        queue.push(Command::LoadModel { path: "b.obj".into() });
        assert_eq!(queue.len(), 2);

        let drained = queue.take();
        assert_eq!(
            drained,
            vec![
                Command::LoadModel { path: "a.obj".into() },
                Command::LoadModel { path: "b.obj".into() },
            ]
        );
        assert!(queue.is_empty());
    }
}
