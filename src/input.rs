use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};

/// Base of the exit status used by the grading hook, the pressed digit is added to it.
pub const DEBUG_EXIT_BASE: i32 = 100;

/// What a key press asks the clock to do.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KeyCommand {
    /// Terminate the process immediately with the given status. Used by automated grading, so it
    /// is always checked before any other binding.
    DebugExit(i32),
    /// Reload both shader files.
    ReloadShaders,
}

/// Maps a pressed key to a command. Escape is handled by the window runner.
pub fn key_command(key: PhysicalKey, modifiers: ModifiersState) -> Option<KeyCommand> {
    if let Some(code) = debug_exit_code(key, modifiers) {
        return Some(KeyCommand::DebugExit(code));
    }
    match key {
        PhysicalKey::Code(KeyCode::KeyR) if modifiers.is_empty() => {
            Some(KeyCommand::ReloadShaders)
        }
        _ => None,
    }
}

/// Shift with exactly one digit key `0..=9` yields exit status `100 + digit`.
pub fn debug_exit_code(key: PhysicalKey, modifiers: ModifiersState) -> Option<i32> {
    if modifiers != ModifiersState::SHIFT {
        return None;
    }
    let digit = match key {
        PhysicalKey::Code(KeyCode::Digit0) => 0,
        PhysicalKey::Code(KeyCode::Digit1) => 1,
        PhysicalKey::Code(KeyCode::Digit2) => 2,
        PhysicalKey::Code(KeyCode::Digit3) => 3,
        PhysicalKey::Code(KeyCode::Digit4) => 4,
        PhysicalKey::Code(KeyCode::Digit5) => 5,
        PhysicalKey::Code(KeyCode::Digit6) => 6,
        PhysicalKey::Code(KeyCode::Digit7) => 7,
        PhysicalKey::Code(KeyCode::Digit8) => 8,
        PhysicalKey::Code(KeyCode::Digit9) => 9,
        _ => return None,
    };
    Some(DEBUG_EXIT_BASE + digit)
}
