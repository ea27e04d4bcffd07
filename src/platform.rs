//! Platform-specific key labels

use crossterm::event::KeyModifiers;

/// Modifier for the step-jump shortcuts
/// - macOS: no Alt+digit in most terminals, so Ctrl is used
/// - Linux/Windows: ALT
#[cfg(target_os = "macos")]
pub const JUMP_MODIFIER: KeyModifiers = KeyModifiers::CONTROL;

#[cfg(not(target_os = "macos"))]
pub const JUMP_MODIFIER: KeyModifiers = KeyModifiers::ALT;

#[cfg(target_os = "macos")]
pub const JUMP_SHORTCUT: &str = "Ctrl+1..4";

#[cfg(not(target_os = "macos"))]
pub const JUMP_SHORTCUT: &str = "Alt+1..4";

pub const NEXT_SHORTCUT: &str = "Ctrl+N";
pub const PREVIOUS_SHORTCUT: &str = "Ctrl+P";
pub const SAVE_DRAFT_SHORTCUT: &str = "Ctrl+S";
pub const DELETE_DRAFT_SHORTCUT: &str = "Ctrl+D";
pub const DISMISS_SHORTCUT: &str = "Ctrl+X";
