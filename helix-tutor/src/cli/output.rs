use std::io::Write;
use std::time::Duration;

use serde::Serialize;

use helix_tutor::Result;

const STREAM_SLICE_CHARS: usize = 10;
const STREAM_DELAY: Duration = Duration::from_millis(20);

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Re-displays a finished answer a few characters at a time.
pub async fn stream(text: &str) -> Result<()> {
    let chars: Vec<char> = text.chars().collect();
    let mut stdout = std::io::stdout();
    for slice in chars.chunks(STREAM_SLICE_CHARS) {
        let piece: String = slice.iter().collect();
        write!(stdout, "{piece}")?;
        stdout.flush()?;
        tokio::time::sleep(STREAM_DELAY).await;
    }
    writeln!(stdout)?;
    Ok(())
}

pub fn preview(content: &str, max_chars: usize) -> String {
    let flat: String = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}
