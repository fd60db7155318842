//! Headless viewer: receive snapshots, interpolate, report the rendered view
//!
//! The receive loop and the render step share nothing but the snapshot
//! buffer, and each holds its lock only long enough to push or sample.

pub mod buffer;
pub mod connection;
pub mod input;
pub mod interpolation;
pub mod view;

pub use buffer::{BufferedSnapshot, SharedSnapshotBuffer, SnapshotBuffer};
pub use connection::{connect, ClientError, Connection};
pub use interpolation::{interpolate_states, lerp, Interpolator};
pub use view::ViewSummary;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::ws::protocol::Direction;

use self::connection::run_receiver;
use self::input::parse_direction;

/// Run the viewer until the server closes, the user interrupts, or an error occurs
pub async fn run(config: ClientConfig) -> Result<(), ClientError> {
    let Connection {
        player_id,
        mut sender,
        receiver,
    } = connect(&config.url).await?;
    info!(url = %config.url, player_id = %player_id, "Connected to server");

    let buffer = SnapshotBuffer::shared(config.buffer_size);
    let mut receive_task = tokio::spawn(run_receiver(receiver, buffer.clone()));

    let (input_tx, mut input_rx) = mpsc::channel::<Direction>(16);
    let input_task = tokio::spawn(read_directions(input_tx));

    let interpolator = Interpolator::new(config.interpolation_delay);
    let report_period = config.report_period();
    let mut frames = interval(config.frame_period());
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_report: Option<Instant> = None;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let result = loop {
        tokio::select! {
            _ = frames.tick() => {
                let state = interpolator.sample(&buffer.lock());

                if last_report.map_or(true, |at| at.elapsed() >= report_period) {
                    last_report = Some(Instant::now());
                    match state {
                        Some(state) => info!("{}", ViewSummary::from_state(&state, &player_id)),
                        None => info!("Waiting for snapshots"),
                    }
                }
            }
            Some(direction) = input_rx.recv() => {
                if let Err(e) = sender.send(direction).await {
                    break Err(e);
                }
            }
            joined = &mut receive_task => {
                break match joined {
                    Ok(Ok(())) => {
                        info!("Server closed the connection");
                        Ok(())
                    }
                    Ok(Err(e)) => Err(e),
                    Err(e) => {
                        warn!(error = %e, "Receive task ended abnormally");
                        Err(ClientError::Closed)
                    }
                };
            }
            _ = &mut ctrl_c => {
                info!("Received Ctrl+C, shutting down");
                break Ok(());
            }
        }
    };

    input_task.abort();
    receive_task.abort();
    sender.close().await;
    result
}

/// Read direction words from stdin, one per line
async fn read_directions(input_tx: mpsc::Sender<Direction>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match parse_direction(&line) {
            Some(direction) => {
                if input_tx.send(direction).await.is_err() {
                    break;
                }
            }
            None => warn!(input = %line.trim(), "Unknown direction"),
        }
    }
}
