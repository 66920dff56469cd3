use crate::app::{AppContext, IconAction, NotificationClick, NotifierError, Result};
use crate::domain::FeedItem;

fn print_items(items: &[FeedItem]) {
    for item in items {
        let saved_marker = if item.is_saved { "*" } else { " " };
        let date = item
            .date
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "                ".to_string());

        println!("{} {} {}", saved_marker, date, item.display_title());
        println!("    {} [{}]", item.url, item.id);
    }
}

fn print_login_hint(logged_in: bool) {
    if !logged_in {
        eprintln!("Not logged in. Set access_token in the configuration file.");
    }
}

pub async fn list_feeds(ctx: &AppContext, force: bool) -> Result<()> {
    let (items, logged_in) = ctx.get_feeds(force).await?;

    if items.is_empty() {
        println!("No unread entries.");
    } else {
        print_items(&items);
    }
    print_login_hint(logged_in);
    Ok(())
}

pub async fn list_saved(ctx: &AppContext, force: bool) -> Result<()> {
    let (items, logged_in) = ctx.get_saved_feeds(force).await?;

    if items.is_empty() {
        println!("No saved entries.");
    } else {
        print_items(&items);
    }
    print_login_hint(logged_in);
    Ok(())
}

pub async fn show_counter(ctx: &AppContext) -> Result<()> {
    match ctx.update_counter().await? {
        Some(count) => println!("{} unread", count),
        None => print_login_hint(false),
    }
    Ok(())
}

pub async fn mark_read(ctx: &AppContext, ids: &[String]) -> Result<()> {
    if ctx.mark_as_read(ids).await? {
        println!("Marked {} entries as read", ids.len());
    } else {
        print_login_hint(false);
    }
    Ok(())
}

pub async fn toggle_saved(ctx: &AppContext, id: &str, save: bool) -> Result<()> {
    if !ctx.toggle_saved(id, save).await? {
        print_login_hint(false);
    } else if save {
        println!("Saved: {}", id);
    } else {
        println!("Unsaved: {}", id);
    }
    Ok(())
}

/// Open a cached unread entry the way a notification click does
pub async fn open_entry(ctx: &AppContext, id: &str) -> Result<()> {
    let (items, _) = ctx.get_feeds(false).await?;
    let item = items
        .into_iter()
        .find(|item| item.id == id)
        .ok_or_else(|| NotifierError::Other(format!("Entry not found: {}", id)))?;

    println!("Opening: {}", item.display_title());
    ctx.notification_clicked(&NotificationClick {
        handle: None,
        item_id: item.id,
        url: item.url,
    })
    .await
}

pub async fn icon(ctx: &AppContext) -> Result<()> {
    // A fresh process only knows the login state after talking to Feedly.
    ctx.update_counter().await?;

    match ctx.icon_clicked().await? {
        IconAction::OpenedSite => println!("Opened Feedly"),
        IconAction::ShowFeeds => list_feeds(ctx, false).await?,
        IconAction::LoginRequired => print_login_hint(false),
    }
    Ok(())
}

pub async fn refresh_token(ctx: &AppContext) -> Result<()> {
    if ctx.refresh_access_token().await? {
        println!("Access token refreshed");
    } else {
        println!("No new access token (missing or rejected refresh token)");
    }
    Ok(())
}
