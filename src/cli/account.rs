use anyhow::{bail, Result};

use crate::{models::SyncStatus, AppState};

pub async fn run_login(state: &AppState, email: &str) -> Result<()> {
    if let Some(current) = state.auth.current() {
        if current.email.eq_ignore_ascii_case(email.trim()) {
            println!("Already logged in as {}", current.email);
            return Ok(());
        }
        state.logout().await?;
    }

    let session = state.login(email).await?;
    println!("Logged in as {} <{}>", session.name, session.email);
    print_pull_outcome(state).await;
    Ok(())
}

pub async fn run_logout(state: &AppState) -> Result<()> {
    if !state.auth.is_logged_in() {
        println!("Not logged in");
        return Ok(());
    }

    state.logout().await?;
    println!("Logged out. Local tasks were kept.");
    Ok(())
}

pub async fn run_status(state: &AppState) -> Result<()> {
    let view = state.sync.view().await;

    match state.auth.current() {
        Some(session) => println!(
            "Session:  {} <{}> ({})",
            session.name, session.email, session.id
        ),
        None => println!("Session:  guest (tasks stay on this device)"),
    }
    println!("Sync:     {}", state.sync.sync_status().as_str());
    println!(
        "Tasks:    {} pending, {} completed",
        view.pending.len(),
        view.completed.len()
    );
    println!("Alerts:   {}", state.notifier.permission().as_str());
    Ok(())
}

pub async fn run_pull(state: &AppState) -> Result<()> {
    let Some(user_id) = state.auth.user_id() else {
        bail!("Log in first to pull from the cloud");
    };

    state.sync.on_login(&user_id).await?;
    print_pull_outcome(state).await;
    Ok(())
}

async fn print_pull_outcome(state: &AppState) {
    match state.sync.sync_status() {
        SyncStatus::Error => println!("Cloud is unreachable; working from the local copy"),
        _ => println!("{} tasks in sync", state.sync.tasks().await.len()),
    }
}
