//! Notification commands

use clap::Args;
use faresight_engine::NotificationFilter;
use faresight_types::{NotificationId, NotificationRecord};
use serde::Serialize;
use tabled::Tabled;

use super::Session;
use crate::output::{print_info, print_output, print_single, OutputFormat};

/// Arguments of `faresight notifications`
#[derive(Args)]
pub struct NotificationsArgs {
    /// Filter: all, unread, warning, error, success or info
    #[arg(long, default_value = "all", value_parser = parse_filter)]
    pub filter: NotificationFilter,

    /// Mark one notification read
    #[arg(long, value_name = "ID")]
    pub mark_read: Option<u64>,

    /// Mark every notification read
    #[arg(long)]
    pub mark_all_read: bool,

    /// Delete one notification
    #[arg(long, value_name = "ID")]
    pub remove: Option<u64>,
}

fn parse_filter(s: &str) -> Result<NotificationFilter, String> {
    NotificationFilter::parse(s).ok_or_else(|| format!("unknown filter: {}", s))
}

#[derive(Tabled, Serialize)]
struct NotificationRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Read")]
    read: String,
}

impl From<&NotificationRecord> for NotificationRow {
    fn from(n: &NotificationRecord) -> Self {
        Self {
            id: n.id.value(),
            kind: n.kind.to_string(),
            title: n.title.clone(),
            message: n.message.clone(),
            created: n.created_at.format("%Y-%m-%d %H:%M").to_string(),
            read: if n.read { "yes" } else { "no" }.to_string(),
        }
    }
}

/// Execute the notifications command
pub fn execute(args: NotificationsArgs, session: &mut Session) -> anyhow::Result<()> {
    let mut store = session.ctx.notifications.write();

    if let Some(id) = args.remove {
        store.remove(NotificationId::from_raw(id));
    }
    if let Some(id) = args.mark_read {
        store.mark_read(NotificationId::from_raw(id));
    }
    if args.mark_all_read {
        store.mark_all_read();
    }

    let listing: Vec<NotificationRecord> = store.filter(args.filter).cloned().collect();
    let unread = store.unread_count();
    drop(store);

    match session.format {
        OutputFormat::Json => print_single(&listing)?,
        OutputFormat::Table => {
            print_output(
                listing.iter().map(NotificationRow::from).collect(),
                OutputFormat::Table,
            )?;
            print_info(&format!("{} unread ({})", unread, args.filter));
        }
    }
    Ok(())
}
