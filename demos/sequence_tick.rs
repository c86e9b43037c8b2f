use tick_timer::prelude::*;

use futures::StreamExt;

// cargo run --example=sequence_tick

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let timer = Timer::with_repeat(Duration::from_millis(300), 3)?;
    let mut ticks = timer.start_sequence(&SchedulingContext::current_tokio());

    while let Some(tick) = ticks.next().await {
        println!("{:?}, active: {}", tick, timer.is_active());
    }

    println!(
        "closed: {}, active: {}",
        ticks.is_closed_for_receive(),
        timer.is_active()
    );

    // Cancelling an open sequence from outside is refused.
    let ticks = timer.start_sequence(&SchedulingContext::current_tokio());
    if let Err(e) = ticks.cancel() {
        println!("{}", e);
    }
    timer.stop();
    assert!(ticks.cancel().is_ok());

    Ok(())
}
