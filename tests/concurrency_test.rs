use fnkit::fnkit_function::build_descriptor;
use fnkit::prelude::*;
use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;

const N: usize = 64;

fn multiplier(index: usize) -> FunctionDescriptor {
    let member = FunctionBuilder::new()
        .name(format!("times_{}", index))
        .description(format!("Multiplies by {}", index))
        .param::<i64>("x", "Value to multiply")
        .handler(move |mut args| async move {
            let x: i64 = args.next()?;
            tokio::task::yield_now().await;
            Ok::<_, InvokeError>(x * index as i64)
        })
        .build()
        .unwrap();
    build_descriptor(&member).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_register_then_dispatch() {
    let registry = Arc::new(FunctionRegistry::new());

    let registrations = (0..N).map(|index| {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move { registry.register_descriptor(multiplier(index)) })
    });
    for outcome in join_all(registrations).await {
        assert!(outcome.unwrap().unwrap().is_none());
    }
    assert_eq!(registry.len(), N);

    let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&registry)));
    let calls = (0..N).map(|index| {
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            let request = CallRequest::new(format!("times_{}", index), r#"{"x": 3}"#);
            (index, dispatcher.dispatch(&request).await)
        })
    });

    let mut successes = 0;
    for outcome in join_all(calls).await {
        let (index, result) = outcome.unwrap();
        assert_eq!(result.value(), Some(&json!(3 * index as i64)));
        successes += 1;
    }
    assert_eq!(successes, N);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_dispatch_while_registering() {
    let registry = Arc::new(FunctionRegistry::new());
    registry.register_descriptor(multiplier(1)).unwrap();
    let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&registry)));

    let writers = (2..N).map(|index| {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            registry.register_descriptor(multiplier(index)).unwrap();
        })
    });
    let readers = (0..N).map(|_| {
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            dispatcher
                .dispatch(&CallRequest::new("times_1", r#"{"x": 7}"#))
                .await
        })
    });

    let (written, read) = tokio::join!(join_all(writers), join_all(readers));
    assert!(written.into_iter().all(|outcome| outcome.is_ok()));
    for outcome in read {
        assert_eq!(outcome.unwrap().value(), Some(&json!(7)));
    }

    assert_eq!(registry.len(), N - 1);
    for spec in registry.list_all() {
        assert!(spec.parameters.is_required("x"));
    }
}
