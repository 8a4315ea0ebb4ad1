use crate::error::{ClientResult, Error};
use crate::utils::time::{parse_date, parse_time};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::path::Path;
use tokio::io::{self, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};

/// Print a prompt and read one line from stdin
pub async fn prompt_line(prompt: &str) -> ClientResult<String> {
    let mut stdout = io::stdout();
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(io::stdin()).read_line(&mut line).await?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Ask a yes/no question; anything but "y"/"yes" is a no
pub async fn confirm(question: &str, assume_yes: bool) -> ClientResult<bool> {
    if assume_yes {
        return Ok(true);
    }
    let answer = prompt_line(&format!("{} [y/N] ", question)).await?;
    Ok(is_yes(&answer))
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Read text from a file, or from stdin when no file is given
pub async fn read_text(file: Option<&Path>) -> ClientResult<String> {
    match file {
        Some(path) => Ok(tokio::fs::read_to_string(path).await?),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).await?;
            Ok(text)
        }
    }
}

/// `YYYY-MM-DD`, or today in `tz` when absent
pub fn date_or_today(value: Option<&str>, tz: &Tz) -> ClientResult<NaiveDate> {
    match value {
        Some(raw) => parse_date(raw)
            .ok_or_else(|| Error::Validation(format!("Invalid date {}, expected YYYY-MM-DD", raw))),
        None => Ok(today(tz)),
    }
}

/// `YYYY-MM`, or the current month in `tz` when absent
pub fn month_or_current(value: Option<&str>, tz: &Tz) -> ClientResult<NaiveDate> {
    match value {
        Some(raw) => parse_date(&format!("{}-01", raw.trim()))
            .ok_or_else(|| Error::Validation(format!("Invalid month {}, expected YYYY-MM", raw))),
        None => Ok(today(tz)),
    }
}

/// `HH:MM` on `date`, as a form input value
pub fn time_on(date: NaiveDate, value: &str) -> ClientResult<String> {
    let (hour, minute) = parse_time(value.trim())
        .ok_or_else(|| Error::Validation(format!("Invalid time {}, expected HH:MM", value)))?;
    Ok(format!("{}T{:02}:{:02}", date.format("%Y-%m-%d"), hour, minute))
}

pub fn today(tz: &Tz) -> NaiveDate {
    Utc::now().with_timezone(tz).date_naive()
}

/// Local rendering of an instant
pub fn format_local(instant: &DateTime<Utc>, tz: &Tz) -> String {
    instant.with_timezone(tz).format("%a %b %-d %Y, %-I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("nope"));
    }

    #[test]
    fn test_argument_parsing() {
        let tz = Tz::UTC;
        let date = date_or_today(Some("2024-04-10"), &tz).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 4, 10).unwrap());
        assert!(date_or_today(Some("10/04/2024"), &tz).is_err());

        let month = month_or_current(Some("2024-02"), &tz).unwrap();
        assert_eq!(month, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert!(month_or_current(Some("2024-13"), &tz).is_err());

        assert_eq!(time_on(date, "7:05").unwrap(), "2024-04-10T07:05");
        assert!(time_on(date, "25:00").is_err());
    }

    #[tokio::test]
    async fn test_confirm_assume_yes_skips_prompt() {
        assert!(confirm("Delete this mission?", true).await.unwrap());
    }

    #[tokio::test]
    async fn test_read_text_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mail.txt");
        std::fs::write(&path, "Meeting tomorrow at 3pm").unwrap();
        assert_eq!(
            read_text(Some(&path)).await.unwrap(),
            "Meeting tomorrow at 3pm"
        );
    }
}
