use tick_timer::prelude::*;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// cargo run --example=callback_tick

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let timer = Timer::new(Duration::from_millis(300));
    let ticks = Arc::new(AtomicUsize::new(0));

    let timer_ref = timer.clone();
    let ticks_ref = ticks.clone();
    timer.start(&SchedulingContext::current_tokio(), move || {
        let n = ticks_ref.fetch_add(1, Ordering::SeqCst) + 1;
        println!("tick {}", n);

        if n == 5 {
            timer_ref.stop();
        }
    });

    timer.join().await;
    println!("stopped after {} ticks", ticks.load(Ordering::SeqCst));
    Ok(())
}
