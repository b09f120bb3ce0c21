//! Linux evdev key code tables.
//!
//! Maps human key names (as used by `press:` actions) and typed characters to
//! Linux input event key codes (from `linux/input-event-codes.h`). Each `Key`
//! carries both its numeric code, for native writes, and its symbolic name,
//! for `evemu-event`.
//!
//! - `key_from_name`: for `press:` (unknown → `None`, caller reports it).
//! - `key_for_char`: for `type:` (unmapped → `None`, caller skips it).

use std::fmt;

// ---------------------------------------------------------------------------
// Key type
// ---------------------------------------------------------------------------

/// A key or button code in the evdev `EV_KEY` namespace.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    code: u16,
    name: &'static str,
}

impl Key {
    pub const fn new(code: u16, name: &'static str) -> Self {
        Self { code, name }
    }

    pub const fn code(self) -> u16 {
        self.code
    }

    /// Symbolic name, e.g. `KEY_A` or `BTN_LEFT`.
    pub const fn name(self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.code)
    }
}

pub const BTN_LEFT: Key = Key::new(0x110, "BTN_LEFT");
pub const KEY_A: Key = Key::new(30, "KEY_A");
pub const KEY_ENTER: Key = Key::new(28, "KEY_ENTER");
pub const KEY_LEFTCTRL: Key = Key::new(29, "KEY_LEFTCTRL");
pub const KEY_LEFTSHIFT: Key = Key::new(42, "KEY_LEFTSHIFT");
pub const KEY_LEFTALT: Key = Key::new(56, "KEY_LEFTALT");
pub const KEY_LEFTMETA: Key = Key::new(125, "KEY_LEFTMETA");
pub const KEY_SPACE: Key = Key::new(57, "KEY_SPACE");
pub const KEY_TAB: Key = Key::new(15, "KEY_TAB");

// ---------------------------------------------------------------------------
// Name → Key
// ---------------------------------------------------------------------------

/// Resolves a case-insensitive key name to its evdev key.
///
/// Modifiers resolve to their left-side variant; `super` and `meta` are
/// aliases.
pub fn key_from_name(name: &str) -> Option<Key> {
    let lower = name.to_ascii_lowercase();
    let key = match lower.as_str() {
        // Letters
        "a" => KEY_A,
        "b" => Key::new(48, "KEY_B"),
        "c" => Key::new(46, "KEY_C"),
        "d" => Key::new(32, "KEY_D"),
        "e" => Key::new(18, "KEY_E"),
        "f" => Key::new(33, "KEY_F"),
        "g" => Key::new(34, "KEY_G"),
        "h" => Key::new(35, "KEY_H"),
        "i" => Key::new(23, "KEY_I"),
        "j" => Key::new(36, "KEY_J"),
        "k" => Key::new(37, "KEY_K"),
        "l" => Key::new(38, "KEY_L"),
        "m" => Key::new(50, "KEY_M"),
        "n" => Key::new(49, "KEY_N"),
        "o" => Key::new(24, "KEY_O"),
        "p" => Key::new(25, "KEY_P"),
        "q" => Key::new(16, "KEY_Q"),
        "r" => Key::new(19, "KEY_R"),
        "s" => Key::new(31, "KEY_S"),
        "t" => Key::new(20, "KEY_T"),
        "u" => Key::new(22, "KEY_U"),
        "v" => Key::new(47, "KEY_V"),
        "w" => Key::new(17, "KEY_W"),
        "x" => Key::new(45, "KEY_X"),
        "y" => Key::new(21, "KEY_Y"),
        "z" => Key::new(44, "KEY_Z"),

        // Top-row digits (2–11 = 1–0)
        "1" => Key::new(2, "KEY_1"),
        "2" => Key::new(3, "KEY_2"),
        "3" => Key::new(4, "KEY_3"),
        "4" => Key::new(5, "KEY_4"),
        "5" => Key::new(6, "KEY_5"),
        "6" => Key::new(7, "KEY_6"),
        "7" => Key::new(8, "KEY_7"),
        "8" => Key::new(9, "KEY_8"),
        "9" => Key::new(10, "KEY_9"),
        "0" => Key::new(11, "KEY_0"),

        // Modifiers and editing
        "shift" => KEY_LEFTSHIFT,
        "ctrl" => KEY_LEFTCTRL,
        "alt" => KEY_LEFTALT,
        "meta" | "super" => KEY_LEFTMETA,
        "space" => KEY_SPACE,
        "enter" => KEY_ENTER,
        "tab" => KEY_TAB,
        "backspace" => Key::new(14, "KEY_BACKSPACE"),
        "esc" => Key::new(1, "KEY_ESC"),
        "delete" => Key::new(111, "KEY_DELETE"),
        "insert" => Key::new(110, "KEY_INSERT"),
        "capslock" => Key::new(58, "KEY_CAPSLOCK"),

        // Function keys F1–F12
        "f1" => Key::new(59, "KEY_F1"),
        "f2" => Key::new(60, "KEY_F2"),
        "f3" => Key::new(61, "KEY_F3"),
        "f4" => Key::new(62, "KEY_F4"),
        "f5" => Key::new(63, "KEY_F5"),
        "f6" => Key::new(64, "KEY_F6"),
        "f7" => Key::new(65, "KEY_F7"),
        "f8" => Key::new(66, "KEY_F8"),
        "f9" => Key::new(67, "KEY_F9"),
        "f10" => Key::new(68, "KEY_F10"),
        "f11" => Key::new(87, "KEY_F11"),
        "f12" => Key::new(88, "KEY_F12"),

        // Function keys F13–F24
        "f13" => Key::new(183, "KEY_F13"),
        "f14" => Key::new(184, "KEY_F14"),
        "f15" => Key::new(185, "KEY_F15"),
        "f16" => Key::new(186, "KEY_F16"),
        "f17" => Key::new(187, "KEY_F17"),
        "f18" => Key::new(188, "KEY_F18"),
        "f19" => Key::new(189, "KEY_F19"),
        "f20" => Key::new(190, "KEY_F20"),
        "f21" => Key::new(191, "KEY_F21"),
        "f22" => Key::new(192, "KEY_F22"),
        "f23" => Key::new(193, "KEY_F23"),
        "f24" => Key::new(194, "KEY_F24"),

        // Navigation
        "up" => Key::new(103, "KEY_UP"),
        "down" => Key::new(108, "KEY_DOWN"),
        "left" => Key::new(105, "KEY_LEFT"),
        "right" => Key::new(106, "KEY_RIGHT"),
        "home" => Key::new(102, "KEY_HOME"),
        "end" => Key::new(107, "KEY_END"),
        "pageup" => Key::new(104, "KEY_PAGEUP"),
        "pagedown" => Key::new(109, "KEY_PAGEDOWN"),

        // Numpad
        "num0" => Key::new(82, "KEY_KP0"),
        "num1" => Key::new(79, "KEY_KP1"),
        "num2" => Key::new(80, "KEY_KP2"),
        "num3" => Key::new(81, "KEY_KP3"),
        "num4" => Key::new(75, "KEY_KP4"),
        "num5" => Key::new(76, "KEY_KP5"),
        "num6" => Key::new(77, "KEY_KP6"),
        "num7" => Key::new(71, "KEY_KP7"),
        "num8" => Key::new(72, "KEY_KP8"),
        "num9" => Key::new(73, "KEY_KP9"),
        "numlock" => Key::new(69, "KEY_NUMLOCK"),
        "numdivide" => Key::new(98, "KEY_KPSLASH"),
        "nummultiply" => Key::new(55, "KEY_KPASTERISK"),
        "numminus" => Key::new(74, "KEY_KPMINUS"),
        "numplus" => Key::new(78, "KEY_KPPLUS"),
        "numenter" => Key::new(96, "KEY_KPENTER"),
        "numdot" => Key::new(83, "KEY_KPDOT"),

        // Punctuation (unshifted US layout)
        "`" => Key::new(41, "KEY_GRAVE"),
        "-" => Key::new(12, "KEY_MINUS"),
        "=" => Key::new(13, "KEY_EQUAL"),
        "[" => Key::new(26, "KEY_LEFTBRACE"),
        "]" => Key::new(27, "KEY_RIGHTBRACE"),
        "\\" => Key::new(43, "KEY_BACKSLASH"),
        ";" => Key::new(39, "KEY_SEMICOLON"),
        "'" => Key::new(40, "KEY_APOSTROPHE"),
        "," => Key::new(51, "KEY_COMMA"),
        "." => Key::new(52, "KEY_DOT"),
        "/" => Key::new(53, "KEY_SLASH"),

        _ => return None,
    };
    Some(key)
}

// ---------------------------------------------------------------------------
// Character → Key
// ---------------------------------------------------------------------------

/// Resolves one typed character to the key that produces it unshifted.
///
/// Callers lowercase text before typing; uppercase letters and shifted
/// symbols have no entry and are skipped.
pub fn key_for_char(c: char) -> Option<Key> {
    match c {
        ' ' => Some(KEY_SPACE),
        '\n' => Some(KEY_ENTER),
        '\t' => Some(KEY_TAB),
        c if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_ascii_punctuation() => {
            let mut buf = [0u8; 4];
            key_from_name(c.encode_utf8(&mut buf))
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spot_check_letter_codes() {
        assert_eq!(key_from_name("a").map(Key::code), Some(30));
        assert_eq!(key_from_name("z").map(Key::code), Some(44));
        assert_eq!(key_from_name("q").map(Key::code), Some(16));
        assert_eq!(key_from_name("m").map(Key::code), Some(50));
    }

    #[test]
    fn spot_check_digit_codes() {
        assert_eq!(key_from_name("1").map(Key::code), Some(2));
        assert_eq!(key_from_name("0").map(Key::code), Some(11));
    }

    #[test]
    fn spot_check_function_key_codes() {
        assert_eq!(key_from_name("f1").map(Key::code), Some(59));
        assert_eq!(key_from_name("F12").map(Key::code), Some(88));
        assert_eq!(key_from_name("f13").map(Key::code), Some(183));
        assert_eq!(key_from_name("f24").map(Key::code), Some(194));
    }

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(key_from_name("ENTER"), Some(KEY_ENTER));
        assert_eq!(key_from_name("Ctrl"), Some(KEY_LEFTCTRL));
    }

    #[test]
    fn super_and_meta_are_aliases() {
        assert_eq!(key_from_name("super"), key_from_name("meta"));
        assert_eq!(key_from_name("super").map(Key::name), Some("KEY_LEFTMETA"));
    }

    #[test]
    fn numpad_names_resolve() {
        assert_eq!(key_from_name("numenter").map(Key::name), Some("KEY_KPENTER"));
        assert_eq!(key_from_name("num7").map(Key::code), Some(71));
    }

    #[test]
    fn unknown_name_returns_none() {
        assert_eq!(key_from_name("hyper"), None);
        assert_eq!(key_from_name(""), None);
    }

    #[test]
    fn whitespace_characters_map_to_keys() {
        assert_eq!(key_for_char(' '), Some(KEY_SPACE));
        assert_eq!(key_for_char('\n'), Some(KEY_ENTER));
        assert_eq!(key_for_char('\t'), Some(KEY_TAB));
    }

    #[test]
    fn punctuation_characters_map_to_keys() {
        assert_eq!(key_for_char('.').map(Key::name), Some("KEY_DOT"));
        assert_eq!(key_for_char(';').map(Key::name), Some("KEY_SEMICOLON"));
    }

    #[test]
    fn unmapped_characters_return_none() {
        assert_eq!(key_for_char('A'), None);
        assert_eq!(key_for_char('!'), None);
        assert_eq!(key_for_char('é'), None);
    }
}
