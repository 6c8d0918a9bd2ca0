/// Ordered command storage
///
/// Commands live in a slot map; `order` keeps their keys sorted by ascending
/// sort key. The sort is stable, so commands with equal keys draw in
/// registration order.

use slotmap::SlotMap;
use crate::command::{Command, CommandKey};

/// Spacing between default sort keys of consecutive registrations
pub const DEFAULT_ORDER_STEP: f64 = 0.001;

pub struct CommandSet {
    commands: SlotMap<CommandKey, Command>,
    order: Vec<CommandKey>,
    registrations: u64,
}

impl CommandSet {
    pub fn new() -> Self {
        Self {
            commands: SlotMap::with_key(),
            order: Vec::new(),
            registrations: 0,
        }
    }

    /// Sort key given to the next command registered without one
    pub fn next_default_order(&self) -> f64 {
        self.registrations as f64 * DEFAULT_ORDER_STEP
    }

    /// Register `command` and re-sort
    pub fn insert(&mut self, command: Command) -> CommandKey {
        let key = self.commands.insert(command);
        self.registrations += 1;
        self.order.push(key);
        self.sort();
        key
    }

    pub fn remove(&mut self, key: CommandKey) -> Option<Command> {
        let command = self.commands.remove(key)?;
        self.order.retain(|k| *k != key);
        Some(command)
    }

    fn sort(&mut self) {
        let commands = &self.commands;
        self.order.sort_by(|a, b| {
            let a = commands.get(*a).map_or(0.0, Command::order);
            let b = commands.get(*b).map_or(0.0, Command::order);
            a.total_cmp(&b)
        });
    }

    pub fn get(&self, key: CommandKey) -> Option<&Command> {
        self.commands.get(key)
    }

    pub fn get_mut(&mut self, key: CommandKey) -> Option<&mut Command> {
        self.commands.get_mut(key)
    }

    /// Keys in draw order
    pub fn keys(&self) -> Vec<CommandKey> {
        self.order.clone()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (CommandKey, &mut Command)> {
        self.commands.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Default for CommandSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "command_set_tests.rs"]
mod tests;
