use tick_timer::prelude::*;

use futures::StreamExt;
use pretty_assertions::assert_eq;
use tokio::time::{sleep, timeout};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_repeat_normal() -> anyhow::Result<()> {
    init_logger();
    let context = SchedulingContext::current_tokio();
    let timer = Timer::with_repeat(Duration::from_millis(50), 3)?;

    let ticks = timer.start_sequence(&context);
    for _ in 0..3 {
        assert_eq!(ticks.recv().await, Some(Tick));
    }
    assert_eq!(ticks.recv().await, None);
    assert!(ticks.is_closed_for_receive());
    assert!(!timer.is_active());

    // Restartable through a fresh start, not through the old sequence.
    let ticks_again = timer.start_sequence(&context);
    assert!(timer.is_active());
    assert_eq!(ticks.recv().await, None);

    let received: Vec<Tick> = ticks_again.collect().await;
    assert_eq!(received.len(), 3);
    assert!(!timer.is_active());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_closed_right_after_last_tick() -> anyhow::Result<()> {
    init_logger();
    let context = SchedulingContext::current_tokio();
    let timer = Timer::with_repeat(Duration::from_millis(1), 3)?;

    for _ in 0..50 {
        let ticks = timer.start_sequence(&context);
        for _ in 0..3 {
            assert_eq!(ticks.recv().await, Some(Tick));
        }

        assert!(ticks.is_closed_for_receive());
        assert!(!timer.is_active());
        assert_eq!(ticks.recv().await, None);
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_receive_from_spawned_task() -> anyhow::Result<()> {
    init_logger();
    let timer = Timer::with_repeat(Duration::from_millis(20), 2)?;
    let ticks = timer.start_sequence(&SchedulingContext::current_tokio());

    let consumer = tokio::spawn(async move {
        let mut received = Vec::new();
        while let Some(tick) = ticks.recv().await {
            received.push(tick);
        }
        received
    });

    assert_eq!(consumer.await?, vec![Tick; 2]);
    assert!(!timer.is_active());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_from_consumer_loop() -> anyhow::Result<()> {
    init_logger();
    let timer = Timer::new(Duration::from_millis(30));
    let mut ticks = timer.start_sequence(&SchedulingContext::current_tokio());

    let mut counter = 0;
    while let Some(_tick) = ticks.next().await {
        counter += 1;

        if counter == 3 {
            timer.stop();
        }
    }

    assert_eq!(counter, 3);
    assert!(!timer.is_active());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_drains_sequence() -> anyhow::Result<()> {
    init_logger();
    let timer = Timer::new(Duration::from_millis(30));
    let ticks = timer.start_sequence(&SchedulingContext::current_tokio());

    // Ticks are due but nobody receives them.
    sleep(Duration::from_millis(120)).await;
    timer.stop();

    assert!(ticks.is_closed_for_receive());
    let remaining = timeout(Duration::from_millis(200), ticks.count()).await?;
    assert_eq!(remaining, 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_restart_with_sequences() -> anyhow::Result<()> {
    init_logger();
    let context = SchedulingContext::current_tokio();
    let timer = Timer::new(Duration::from_millis(30));

    for _ in 0..2 {
        let mut ticks = timer.start_sequence(&context);

        let stopper = timer.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(100)).await;
            stopper.stop();
        });

        let mut received = 0;
        while ticks.next().await.is_some() {
            received += 1;
        }

        assert!(received >= 1);
        assert!(ticks.is_closed_for_receive());
    }

    assert!(!timer.is_active());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_restart_closes_previous_sequence() -> anyhow::Result<()> {
    init_logger();
    let context = SchedulingContext::current_tokio();
    let timer = Timer::new(Duration::from_millis(30));
    let mut first = timer.start_sequence(&context);

    let restarter = timer.clone();
    let restart_context = context.clone();
    let restarted = tokio::spawn(async move {
        sleep(Duration::from_millis(100)).await;
        restarter.start_sequence(&restart_context)
    });

    while first.next().await.is_some() {}
    assert!(first.is_closed_for_receive());

    let second = restarted.await?;
    assert!(!second.is_closed_for_receive());
    assert!(timer.is_active());
    assert_eq!(second.recv().await, Some(Tick));

    timer.stop();
    assert_eq!(second.recv().await, None);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_is_guarded() -> anyhow::Result<()> {
    init_logger();
    let timer = Timer::new(Duration::from_millis(30));
    let ticks = timer.start_sequence(&SchedulingContext::current_tokio());

    let err = ticks.cancel().unwrap_err();
    assert_eq!(err, TimerError::IllegalOperation);
    assert!(err.to_string().contains("stop()"));

    // The refused cancel left the run untouched.
    assert!(timer.is_active());
    assert_eq!(ticks.recv().await, Some(Tick));

    timer.stop();
    assert!(ticks.cancel().is_ok());
    assert!(ticks.cancel().is_ok());
    assert_eq!(ticks.recv().await, None);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_abandoned_receive_does_not_block_producer() -> anyhow::Result<()> {
    init_logger();
    let timer = Timer::new(Duration::from_millis(50));
    let ticks = timer.start_sequence(&SchedulingContext::current_tokio());

    // Give up before the first tick is due, again and again.
    for _ in 0..5 {
        assert!(timeout(Duration::from_millis(2), ticks.recv()).await.is_err());
    }

    assert_eq!(ticks.recv().await, Some(Tick));

    timer.stop();
    timeout(Duration::from_millis(500), timer.join()).await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_clones_share_ticks() -> anyhow::Result<()> {
    init_logger();
    let timer = Timer::with_repeat(Duration::from_millis(20), 6)?;
    let ticks = timer.start_sequence(&SchedulingContext::current_tokio());

    let left = tokio::spawn(ticks.clone().count());
    let right = tokio::spawn(ticks.count());

    let total = left.await? + right.await?;
    assert_eq!(total, 6);
    assert!(!timer.is_active());
    Ok(())
}
