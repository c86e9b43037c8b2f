use tick_timer::prelude::*;

use futures::StreamExt;

// cargo run --example=status_report --features=full

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut timer = Timer::builder()
        .delay(Duration::from_millis(100))
        .repeat_times(2)
        .enable_status_report()
        .build()?;

    let status_reporter = timer
        .take_status_reporter()
        .ok_or_else(|| anyhow::anyhow!("status report is not enabled"))?;

    let ticks = timer.start_sequence(&SchedulingContext::current_tokio());
    ticks.for_each(|_| async {}).await;

    while let Some(event) = status_reporter.next_public_event() {
        println!("{:?}", event);
    }

    Ok(())
}
