//! End-to-end lifecycle tests: gate behavior, maintenance cycles, and the
//! recovery ladder under a persistently wedged device.

mod common;

use std::sync::Arc;
use std::time::Duration;

use huella_core::SecurityLevel;
use huella_device::VendorStatus;
use huella_session::{CaptureOptions, ServiceError, TemplateSelector};

use common::controller;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_operations_never_overlap_on_the_device() {
    let (controller, script, _usb) = controller();
    controller.initialize().await.unwrap();
    script.set_op_delay(Duration::from_millis(5));

    let controller = Arc::new(controller);
    let mut handles = Vec::new();
    for i in 0..8 {
        let controller = Arc::clone(&controller);
        handles.push(tokio::spawn(async move {
            controller.set_led(i % 2 == 0).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // The gate must have serialized every device call.
    assert_eq!(script.max_in_flight(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_gate_timeout_rejects_as_busy() {
    let (controller, script, _usb) = controller();
    controller.initialize().await.unwrap();

    // One capture that dawdles far past the gate timeout.
    script.set_op_delay(Duration::from_secs(60));
    let controller = Arc::new(controller);
    let slow = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.capture(&CaptureOptions::default()).await })
    };
    tokio::task::yield_now().await;

    let error = controller.set_led(true).await.unwrap_err();
    assert!(matches!(error, ServiceError::DeviceBusy));

    script.set_op_delay(Duration::ZERO);
    slow.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_enrollment_and_verification_flow() {
    let (controller, _script, _usb) = controller();
    controller.initialize().await.unwrap();

    let options = CaptureOptions {
        create_template: true,
        template_id: Some("user-1".into()),
    };
    let outcome = controller.capture(&options).await.unwrap();
    assert!(outcome.template.is_some());
    assert_eq!(controller.templates().ids(), vec!["user-1".to_string()]);

    // A second enrollee with the same sensor produces the same mock
    // template, so verification against the stored one matches.
    let verify = controller
        .capture(&CaptureOptions {
            create_template: true,
            template_id: None,
        })
        .await
        .unwrap();
    let outcome = controller
        .compare(
            &TemplateSelector::Stored("user-1".into()),
            &TemplateSelector::Raw(verify.template.unwrap().to_vec()),
            SecurityLevel::default(),
        )
        .await
        .unwrap();
    assert!(outcome.matched);
    assert!(outcome.score > 0);

    // Deleting the enrollment makes further verification fail fast.
    assert!(controller.templates().remove("user-1"));
    let error = controller
        .compare(
            &TemplateSelector::Stored("user-1".into()),
            &TemplateSelector::Raw(vec![0u8; 400]),
            SecurityLevel::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(error, ServiceError::TemplateNotFound { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_fifty_operation_refresh_cycle() {
    let (controller, script, _usb) = controller();
    controller.initialize().await.unwrap();
    let created_after_init = script.scanners_created();

    // 50 successful operations, then the next gated operation triggers
    // the preventive refresh before running.
    for _ in 0..50 {
        controller.set_led(true).await.unwrap();
    }
    assert_eq!(script.scanners_created(), created_after_init);

    controller.set_led(false).await.unwrap();
    assert_eq!(script.scanners_created(), created_after_init + 1);

    let snapshot = controller.try_snapshot().unwrap();
    assert!(snapshot.initialized);
    // The refreshed counter holds only the post-refresh operation.
    assert_eq!(snapshot.operation_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_wedged_device_walks_the_full_ladder_to_hardware_reset() {
    let (controller, script, usb) = controller();
    controller.initialize().await.unwrap();

    // The reader wedges: one capture attempt hits the access error, and
    // every software reinitialization fails until the bus reset.
    script.queue_get_image_failures(VendorStatus::AccessDenied, 1);
    script.fail_inits(5); // basic + extended + deep's three inner tries

    // Basic tier runs and fails; the capture aborts.
    let error = controller
        .capture(&CaptureOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(error, ServiceError::CaptureFailed { .. }));

    // Extended tier.
    tokio::time::advance(Duration::from_secs(4)).await;
    let error = controller
        .capture(&CaptureOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(error, ServiceError::NotInitialized { .. }));

    // Deep tier.
    tokio::time::advance(Duration::from_secs(4)).await;
    let error = controller
        .capture(&CaptureOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(error, ServiceError::NotInitialized { .. }));
    assert_eq!(usb.call_count(), 0);

    // Ladder exhausted: the hardware tier resets the bus, the device
    // comes back, and the capture finally succeeds.
    tokio::time::advance(Duration::from_secs(4)).await;
    let outcome = controller.capture(&CaptureOptions::default()).await.unwrap();
    assert_eq!(usb.call_count(), 1);
    assert_eq!(outcome.image.len(), 258 * 336);

    let snapshot = controller.try_snapshot().unwrap();
    assert!(snapshot.initialized);
    assert_eq!(snapshot.recovery_attempts, 0);
}

#[tokio::test(start_paused = true)]
async fn test_recovery_rate_limit_spaces_capture_retries() {
    let (controller, script, _usb) = controller();
    controller.initialize().await.unwrap();

    // Every frame hits the access error; the first capture burns one
    // recovery, the immediate retry is suppressed by the spacing window.
    script.queue_get_image_failures(VendorStatus::AccessDenied, 10);
    script.fail_inits(1);

    let error = controller
        .capture(&CaptureOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(error, ServiceError::CaptureFailed { .. }));

    let before = script.count_calls("create");
    let error = controller
        .capture(&CaptureOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(error, ServiceError::NotInitialized { .. }));
    // The suppressed recovery never rebuilt the connection.
    assert_eq!(script.count_calls("create"), before);
}
