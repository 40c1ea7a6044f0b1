use crate::models::DeviceSignals;

/// Separator unlikely to occur in any of the signals
const SEP: &str = "###";

/// Derive the heuristic per-browser identifier from the environment
/// snapshot submitted by the widget.
///
/// Collisions across distinct devices are expected and acceptable: the
/// fingerprint is one of three independent abuse signals, not a security
/// boundary. The same browser usually reproduces the same value but canvas
/// rendering variance or timezone changes can shift it between sessions.
pub fn generate_device_fingerprint(signals: &DeviceSignals) -> String {
    // Trailing ~50 chars of the canvas data-URL capture driver-level
    // rendering variance without hauling the whole image around.
    let chars: Vec<char> = signals.canvas_hash.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(50)..].iter().collect();

    let joined = [
        signals.user_agent.clone(),
        signals.language.clone(),
        signals.color_depth.to_string(),
        format!("{}x{}", signals.screen_width, signals.screen_height),
        signals.timezone_offset.to_string(),
        signals.has_session_storage.to_string(),
        signals.has_local_storage.to_string(),
        tail,
    ]
    .join(SEP);

    // Multiply-shift rolling hash over UTF-16 code units, folded into a
    // 32-bit signed integer (same arithmetic as `(h << 5) - h + c | 0`).
    let mut hash: i32 = 0;
    for unit in joined.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(unit as i32);
    }

    to_base36(hash.unsigned_abs())
}

fn to_base36(mut n: u32) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = String::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize] as char);
        n /= 36;
    }
    out.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals() -> DeviceSignals {
        DeviceSignals {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/126.0".to_string(),
            language: "fr-FR".to_string(),
            color_depth: 24,
            screen_width: 1920,
            screen_height: 1080,
            timezone_offset: -120,
            has_session_storage: true,
            has_local_storage: true,
            canvas_hash: "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAMgAAAAUCAYAAADskT9P"
                .to_string(),
        }
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let sig = signals();
        let a = generate_device_fingerprint(&sig);
        let b = generate_device_fingerprint(&sig);
        assert_eq!(a, b);
        assert!(!a.is_empty());
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_fingerprint_changes_with_each_signal() {
        let base = generate_device_fingerprint(&signals());

        let mut ua = signals();
        ua.user_agent = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0) Safari/605.1".to_string();

        let mut lang = signals();
        lang.language = "en-US".to_string();

        let mut screen = signals();
        screen.screen_width = 390;
        screen.screen_height = 844;

        let mut tz = signals();
        tz.timezone_offset = 300;

        for variant in [&ua, &lang, &screen, &tz] {
            assert_ne!(base, generate_device_fingerprint(variant));
        }
    }

    #[test]
    fn test_fingerprint_handles_empty_signals() {
        let sig = DeviceSignals {
            user_agent: String::new(),
            language: String::new(),
            color_depth: 0,
            screen_width: 0,
            screen_height: 0,
            timezone_offset: 0,
            has_session_storage: false,
            has_local_storage: false,
            canvas_hash: String::new(),
        };
        // Still produces a stable non-panicking value
        assert_eq!(
            generate_device_fingerprint(&sig),
            generate_device_fingerprint(&sig)
        );
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(u32::MAX), "1z141z3");
    }
}
