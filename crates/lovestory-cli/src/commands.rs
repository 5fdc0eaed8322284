use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use lovestory_core::api::{CoupleSettings, NewSpecialDate, UpdateProfile, UploadItem};
use lovestory_core::memories::today_utc;
use lovestory_core::{
    compute_days_together, filter_by_search, filter_by_type, filter_on_this_day, group_by_year_month,
    group_memories_by_year, ApiClient, MediaFilter, MediaRecord, PairingAction, PairingState,
    SearchQuery,
};
use tracing::warn;

use crate::render;
use crate::{Command, CoupleCommand, DatesCommand, NotificationsCommand, SettingsCommand};

pub async fn run(client: &ApiClient, command: Command) -> Result<()> {
    match command {
        Command::Login { username, password } => {
            let password = password_or_stdin(password)?;
            client.login(&username, &password).await?;
            println!("Logged in as {}", username);
        }
        Command::Register { username, password } => {
            let password = password_or_stdin(password)?;
            client.register(&username, &password).await?;
            println!("Account {} created. Log in with `lovestory login {}`.", username, username);
        }
        Command::Logout => {
            client.logout()?;
            println!("Logged out");
        }
        Command::Me {
            display_name,
            email,
            birthday,
            avatar,
        } => me(client, display_name, email, birthday, avatar).await?,
        Command::Timeline { media_type } => {
            let media = client.list_media(media_type).await?;
            print!("{}", render::timeline(&group_by_year_month(&media)));
        }
        Command::Memories { today } => memories(client, today).await?,
        Command::Search {
            caption,
            tag,
            date,
            media_type,
        } => {
            let media = client.list_media(media_type).await?;
            let query = SearchQuery { caption, tag, date };
            // The server may ignore an unknown `type`, so filter again locally
            let typed: Vec<MediaRecord> = filter_by_type(&media, media_type).into_iter().cloned().collect();
            print!("{}", render::records(&filter_by_search(&typed, &query)));
        }
        Command::Upload {
            files,
            caption,
            tags,
            date,
        } => upload(client, files, caption, tags, date).await?,
        Command::Delete { id } => {
            client.delete_media(id).await?;
            println!("Deleted media {}", id);
        }
        Command::Couple { command } => couple(client, command).await?,
        Command::DaysTogether { since } => {
            let today = today_utc();
            let days = match since {
                Some(since) => compute_days_together(Some(since), today),
                None => match client.my_couple().await? {
                    Some(couple) => couple.days_together(today),
                    None => {
                        println!("Not in a couple yet.");
                        return Ok(());
                    }
                },
            };
            println!("{} days together", days);
        }
        Command::Dates { command } => dates(client, command).await?,
        Command::Notifications { command } => match command {
            NotificationsCommand::List { unread } => {
                let mut list = client.notifications().await?;
                if unread {
                    list.retain(|n| !n.read);
                }
                print!("{}", render::notifications(&list));
            }
            NotificationsCommand::Read { id } => {
                client.mark_notification_read(id).await?;
                println!("Marked notification {} as read", id);
            }
        },
        Command::Settings { command } => match command {
            SettingsCommand::Show => {
                let settings = client.couple_settings().await?;
                print!("{}", render::settings(&settings));
            }
            SettingsCommand::Set {
                theme,
                font,
                background,
                notifications,
            } => {
                let update = CoupleSettings {
                    theme,
                    font,
                    background,
                    notifications_enabled: notifications,
                    ..CoupleSettings::default()
                };
                let settings = client.update_couple_settings(&update).await?;
                print!("{}", render::settings(&settings));
            }
        },
    }
    Ok(())
}

fn password_or_stdin(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    eprint!("Password: ");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("Password must not be empty");
    }
    Ok(password)
}

async fn me(
    client: &ApiClient,
    display_name: Option<String>,
    email: Option<String>,
    birthday: Option<NaiveDate>,
    avatar: Option<PathBuf>,
) -> Result<()> {
    let update = UpdateProfile {
        display_name,
        email,
        birthday: birthday.map(|d| d.format("%Y-%m-%d").to_string()),
    };
    let mut profile = if update.is_empty() {
        client.me().await?
    } else {
        client.update_profile(&update).await?
    };
    if let Some(path) = avatar {
        profile = client
            .upload_avatar(&path)
            .await
            .with_context(|| format!("Failed to upload avatar {}", path.display()))?;
    }
    print!("{}", render::profile(&profile));
    Ok(())
}

async fn memories(client: &ApiClient, today: Option<NaiveDate>) -> Result<()> {
    let (today, media) = match today {
        // A chosen day is filtered locally; the server only knows its own today
        Some(day) => {
            let all = client.list_media(MediaFilter::All).await?;
            let found: Vec<MediaRecord> = filter_on_this_day(&all, day).into_iter().cloned().collect();
            (day, found)
        }
        None => {
            let today = today_utc();
            (today, client.on_this_day(today).await?)
        }
    };
    let refs: Vec<&MediaRecord> = media.iter().collect();
    print!("{}", render::memories(today, &group_memories_by_year(&refs)));
    Ok(())
}

fn parse_tags(tags: Option<String>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

async fn upload(
    client: &ApiClient,
    files: Vec<PathBuf>,
    caption: Option<String>,
    tags: Option<String>,
    date: Option<NaiveDate>,
) -> Result<()> {
    let tags = parse_tags(tags);
    let total = files.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
            .context("Invalid progress template")?
            .progress_chars("=> "),
    );

    let mut failed = 0usize;
    for path in files {
        pb.set_message(path.display().to_string());
        let item = UploadItem {
            path: path.clone(),
            caption: caption.clone(),
            tags: tags.clone(),
            media_date: date,
        };
        match client.upload_media(&item).await {
            Ok(record) => pb.println(format!("uploaded {} -> {}", path.display(), render::record_line(&record))),
            // A dropped session will fail every remaining file too
            Err(e) if e.is_unauthorized() => {
                pb.abandon();
                return Err(e.into());
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "upload failed");
                failed += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!("Uploaded {} of {} files", total - failed, total);
    if failed > 0 {
        bail!("{} uploads failed", failed);
    }
    Ok(())
}

async fn couple(client: &ApiClient, command: CoupleCommand) -> Result<()> {
    let today = today_utc();
    let state = client.pairing_state().await?;

    match command {
        CoupleCommand::Status => {
            print!("{}", render::pairing(&state, today));
            if matches!(state, PairingState::Unconnected | PairingState::Disconnected) {
                if let Some(code) = client.invite_code().await? {
                    println!("Your invite code: {}", code);
                }
            }
        }
        CoupleCommand::Request { invite_code } => {
            state.ensure_allowed(&PairingAction::SendRequest)?;
            let request = client.send_request(&invite_code).await?;
            println!("Request {} sent", request.id);
        }
        CoupleCommand::Accept { id } => {
            state.ensure_allowed(&PairingAction::Accept(id))?;
            let couple = client.accept_request(id).await?;
            print!("{}", render::pairing(&PairingState::Connected(couple), today));
        }
        CoupleCommand::Reject { id } => {
            state.ensure_allowed(&PairingAction::Reject(id))?;
            client.reject_request(id).await?;
            println!("Request {} rejected", id);
        }
        CoupleCommand::Cancel => {
            state.ensure_allowed(&PairingAction::CancelRequest)?;
            if let Some(request) = state.sent_request() {
                client.cancel_request(request.id).await?;
                println!("Request {} cancelled", request.id);
            }
        }
        CoupleCommand::Breakup { yes } => {
            state.ensure_allowed(&PairingAction::Breakup)?;
            if !yes {
                bail!("This ends the couple for both partners; pass --yes to confirm");
            }
            client.breakup().await?;
            println!("The couple has been dissolved.");
        }
    }
    Ok(())
}

async fn dates(client: &ApiClient, command: DatesCommand) -> Result<()> {
    match command {
        DatesCommand::List => {
            let dates = client.special_dates().await?;
            print!("{}", render::special_dates(&dates));
        }
        DatesCommand::Add {
            name,
            date,
            kind,
            user_id,
        } => {
            let created = client
                .create_special_date(&NewSpecialDate {
                    kind,
                    name,
                    date,
                    user_id,
                })
                .await?;
            print!("{}", render::special_dates(std::slice::from_ref(&created)));
        }
        DatesCommand::Update {
            id,
            name,
            date,
            kind,
            user_id,
        } => {
            let updated = client
                .update_special_date(
                    id,
                    &NewSpecialDate {
                        kind,
                        name,
                        date,
                        user_id,
                    },
                )
                .await?;
            print!("{}", render::special_dates(std::slice::from_ref(&updated)));
        }
        DatesCommand::Delete { id } => {
            client.delete_special_date(id).await?;
            println!("Deleted special date {}", id);
        }
    }
    Ok(())
}
