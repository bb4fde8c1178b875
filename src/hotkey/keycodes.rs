//! Key code mapping for the global input hook.
//!
//! Activation settings store macOS virtual key codes (Carbon `Events.h`
//! values), which is also what the original settings UI captures. rdev
//! reports keys as an enum, so hook events are mapped through this table
//! before they reach the tracker. `Key::Unknown` codes pass through
//! untouched.

use rdev::Key;

/// Convert an rdev key to a macOS virtual key code.
///
/// Returns `None` for keys with no stable virtual code (dead keys, some
/// international layouts).
pub fn key_to_code(key: Key) -> Option<u32> {
    let code = match key {
        Key::KeyA => 0,
        Key::KeyS => 1,
        Key::KeyD => 2,
        Key::KeyF => 3,
        Key::KeyH => 4,
        Key::KeyG => 5,
        Key::KeyZ => 6,
        Key::KeyX => 7,
        Key::KeyC => 8,
        Key::KeyV => 9,
        Key::KeyB => 11,
        Key::KeyQ => 12,
        Key::KeyW => 13,
        Key::KeyE => 14,
        Key::KeyR => 15,
        Key::KeyY => 16,
        Key::KeyT => 17,
        Key::Num1 => 18,
        Key::Num2 => 19,
        Key::Num3 => 20,
        Key::Num4 => 21,
        Key::Num6 => 22,
        Key::Num5 => 23,
        Key::Equal => 24,
        Key::Num9 => 25,
        Key::Num7 => 26,
        Key::Minus => 27,
        Key::Num8 => 28,
        Key::Num0 => 29,
        Key::RightBracket => 30,
        Key::KeyO => 31,
        Key::KeyU => 32,
        Key::LeftBracket => 33,
        Key::KeyI => 34,
        Key::KeyP => 35,
        Key::Return => 36,
        Key::KeyL => 37,
        Key::KeyJ => 38,
        Key::Quote => 39,
        Key::KeyK => 40,
        Key::SemiColon => 41,
        Key::BackSlash => 42,
        Key::Comma => 43,
        Key::Slash => 44,
        Key::KeyN => 45,
        Key::KeyM => 46,
        Key::Dot => 47,
        Key::Tab => 48,
        Key::Space => 49,
        Key::BackQuote => 50,
        Key::Backspace => 51,
        Key::Escape => 53,
        Key::MetaRight => 54,
        Key::MetaLeft => 55,
        Key::ShiftLeft => 56,
        Key::CapsLock => 57,
        Key::Alt => 58,
        Key::ControlLeft => 59,
        Key::ShiftRight => 60,
        Key::AltGr => 61,
        Key::ControlRight => 62,
        Key::Function => 63,
        Key::F5 => 96,
        Key::F6 => 97,
        Key::F7 => 98,
        Key::F3 => 99,
        Key::F8 => 100,
        Key::F9 => 101,
        Key::F11 => 103,
        Key::F10 => 109,
        Key::F12 => 111,
        Key::Home => 115,
        Key::PageUp => 116,
        Key::Delete => 117,
        Key::F4 => 118,
        Key::End => 119,
        Key::F2 => 120,
        Key::PageDown => 121,
        Key::F1 => 122,
        Key::LeftArrow => 123,
        Key::RightArrow => 124,
        Key::DownArrow => 125,
        Key::UpArrow => 126,
        Key::Unknown(code) => code,
        _ => return None,
    };
    Some(code)
}

/// Human-readable name for a key code, for the settings UI and logs.
pub fn code_to_name(code: u32) -> String {
    match code {
        0 => "A".to_string(),
        1 => "S".to_string(),
        2 => "D".to_string(),
        3 => "F".to_string(),
        4 => "H".to_string(),
        5 => "G".to_string(),
        6 => "Z".to_string(),
        7 => "X".to_string(),
        8 => "C".to_string(),
        9 => "V".to_string(),
        11 => "B".to_string(),
        12 => "Q".to_string(),
        13 => "W".to_string(),
        14 => "E".to_string(),
        15 => "R".to_string(),
        16 => "Y".to_string(),
        17 => "T".to_string(),
        18 => "1".to_string(),
        19 => "2".to_string(),
        20 => "3".to_string(),
        21 => "4".to_string(),
        22 => "6".to_string(),
        23 => "5".to_string(),
        25 => "9".to_string(),
        26 => "7".to_string(),
        28 => "8".to_string(),
        29 => "0".to_string(),
        31 => "O".to_string(),
        32 => "U".to_string(),
        34 => "I".to_string(),
        35 => "P".to_string(),
        36 => "Return".to_string(),
        37 => "L".to_string(),
        38 => "J".to_string(),
        40 => "K".to_string(),
        45 => "N".to_string(),
        46 => "M".to_string(),
        48 => "Tab".to_string(),
        49 => "Space".to_string(),
        51 => "Backspace".to_string(),
        53 => "Escape".to_string(),
        54 => "Right Command".to_string(),
        55 => "Command".to_string(),
        56 => "Shift".to_string(),
        57 => "Caps Lock".to_string(),
        58 => "Option".to_string(),
        59 => "Control".to_string(),
        60 => "Right Shift".to_string(),
        61 => "Right Option".to_string(),
        62 => "Right Control".to_string(),
        63 => "Fn".to_string(),
        123 => "Left Arrow".to_string(),
        124 => "Right Arrow".to_string(),
        125 => "Down Arrow".to_string(),
        126 => "Up Arrow".to_string(),
        other => format!("Key({})", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_map_to_virtual_codes() {
        assert_eq!(key_to_code(Key::KeyA), Some(0));
        assert_eq!(key_to_code(Key::KeyV), Some(9));
        assert_eq!(key_to_code(Key::Space), Some(49));
    }

    #[test]
    fn modifiers_map_to_virtual_codes() {
        assert_eq!(key_to_code(Key::Alt), Some(58));
        assert_eq!(key_to_code(Key::ControlLeft), Some(59));
        assert_eq!(key_to_code(Key::ShiftLeft), Some(56));
    }

    #[test]
    fn unknown_codes_pass_through() {
        assert_eq!(key_to_code(Key::Unknown(200)), Some(200));
    }

    #[test]
    fn code_names_cover_default_hotkey() {
        assert_eq!(code_to_name(58), "Option");
        assert_eq!(code_to_name(200), "Key(200)");
    }
}
