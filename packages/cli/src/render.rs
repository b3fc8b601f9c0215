//! Terminal output for page state and effects.

use anyhow::bail;
use api::HistoryRecord;
use pages::{format_time, Effect, FieldErrors, NoticeLevel, Route};
use store::UserInfo;

/// Print a success notice, or turn an error notice into a command failure.
pub fn finish(effect: Effect) -> anyhow::Result<()> {
    let Some(notice) = effect.notice else {
        return Ok(());
    };
    match notice.level {
        NoticeLevel::Success => {
            println!("{}", notice.text);
            Ok(())
        }
        NoticeLevel::Error if effect.navigate == Some(Route::Login) => {
            bail!("{}; run `layergen login <phone> <code>`", notice.text)
        }
        NoticeLevel::Error => bail!("{}", notice.text),
    }
}

pub fn field_errors(errors: &FieldErrors) -> anyhow::Result<()> {
    let messages: Vec<String> = [&errors.phone, &errors.code]
        .into_iter()
        .flatten()
        .map(ToString::to_string)
        .collect();
    if messages.is_empty() {
        Ok(())
    } else {
        bail!("{}", messages.join("; "))
    }
}

pub fn user(user: &UserInfo) {
    println!("nickname: {}", user.nickname);
    println!("phone:    {}", user.phone);
    if let Some(avatar) = &user.avatar {
        println!("avatar:   {avatar}");
    }
}

pub fn history(records: &[HistoryRecord]) {
    if records.is_empty() {
        println!("No layers generated yet. Run `layergen upload <file> --layer <type>`.");
        return;
    }
    for (position, record) in records.iter().enumerate() {
        let layer = record
            .layer()
            .map(|layer| layer.label())
            .unwrap_or(record.layer_type.as_str());
        println!(
            "{:>3}  {:16}  {:14}  {}  {}",
            position + 1,
            format_time(&record.created_at),
            layer,
            record.filename,
            record.status.as_deref().unwrap_or("")
        );
    }
}
