use tick_timer::prelude::*;

use futures::StreamExt;
use std::sync::Arc;

// cargo run --example=smol_sequence

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let executor = Arc::new(SmolExecutor::new());
    let context = SchedulingContext::from(executor.clone());
    let timer = Timer::with_repeat(Duration::from_millis(200), 4)?;

    smol::block_on(executor.run(async {
        let ticks = timer.start_sequence(&context);
        let count = ticks.count().await;
        println!("received {} ticks on smol", count);
        timer.join().await;
    }));

    Ok(())
}
