/// Commands that talk to a running pipeline over the control socket
use anyhow::Result;
use clap::ValueEnum;
use muffle_core::{config::get_data_dir, ipc::ControlClient};

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Switch {
    On,
    Off,
}

fn client() -> Result<ControlClient> {
    Ok(ControlClient::new(&get_data_dir()?.join("muffle.sock")))
}

pub async fn toggle(state: Switch) -> Result<()> {
    let enabled = matches!(state, Switch::On);
    client()?.toggle(enabled).await?;
    println!("Suppression {}.", if enabled { "enabled" } else { "disabled" });
    Ok(())
}

pub async fn show_status() -> Result<()> {
    let status = client()?.status().await?;
    println!(
        "Suppression: {}",
        if status.enabled { "enabled" } else { "disabled" }
    );
    println!(
        "Watching:    {}",
        if status.watching { "yes" } else { "no" }
    );
    println!("Items:       {}", status.items);
    println!(
        "  toxic {}, benign {}, failed {}, pending {}, unclassified {}",
        status.toxic, status.benign, status.errors, status.pending, status.unclassified
    );
    println!("Blurred:     {}", status.suppressed);
    println!("In flight:   {}", status.in_flight);
    Ok(())
}

pub async fn stop() -> Result<()> {
    client()?.stop().await?;
    log::info!("Pipeline stopped.");
    Ok(())
}
