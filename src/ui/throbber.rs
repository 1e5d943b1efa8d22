//! Braille spinner for in-flight network work.

const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Spinner frame for an elapsed time; cycles every 100ms.
pub fn spinner_char(elapsed_secs: f32) -> char {
    let ticks = if elapsed_secs.is_finite() && elapsed_secs > 0.0 {
        (elapsed_secs * 10.0) as usize
    } else {
        0
    };
    SPINNER[ticks % SPINNER.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_cycles() {
        assert_eq!(spinner_char(0.0), '⠋');
        assert_eq!(spinner_char(0.15), '⠙');
        assert_eq!(spinner_char(1.0), '⠋');
        assert_eq!(spinner_char(f32::NAN), '⠋');
    }
}
