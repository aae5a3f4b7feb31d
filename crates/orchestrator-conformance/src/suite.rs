//! The `orchestrator_conformance_tests!` macro.
//!
//! Generates one `#[tokio::test]` per orchestrator obligation for any
//! [`OrchestratorFactory`](crate::OrchestratorFactory).
//!
//! # Usage
//!
//! ```rust,ignore
//! use tag_inventory_orchestrator_conformance::{
//!     orchestrator_conformance_tests, OrchestratorFactory, OrchestratorParts,
//! };
//!
//! struct MyFactory;
//!
//! impl OrchestratorFactory for MyFactory {
//!     type Orchestrator = MyOrchestrator;
//!     fn build(&self, parts: OrchestratorParts) -> MyOrchestrator { /* ... */ }
//! }
//!
//! orchestrator_conformance_tests!(MyFactory);
//! ```
//!
//! Each generated test is named `conformance_oNN_<obligation>`; run the
//! whole suite with `cargo test conformance_`.

/// Generate conformance tests for an orchestrator factory.
///
/// `$factory_expr` is evaluated fresh for each test.
#[macro_export]
macro_rules! orchestrator_conformance_tests {
    ($factory_expr:expr) => {
        #[tokio::test]
        async fn conformance_o01_loop_termination() {
            let factory = $factory_expr;
            $crate::tests::o01_loop_termination::test_o01_loop_termination(&factory)
                .await
                .expect("O1: loop termination conformance failed");
        }

        #[tokio::test]
        async fn conformance_o02_resume() {
            let factory = $factory_expr;
            $crate::tests::o02_resume::test_o02_resume(&factory)
                .await
                .expect("O2: resume conformance failed");
        }

        #[tokio::test]
        async fn conformance_o02_resume_exhausted() {
            let factory = $factory_expr;
            $crate::tests::o02_resume::test_o02_resume_exhausted(&factory)
                .await
                .expect("O2: exhausted-checkpoint resume conformance failed");
        }

        #[tokio::test]
        async fn conformance_o03_fatal_error() {
            let factory = $factory_expr;
            $crate::tests::o03_fatal_error::test_o03_fatal_error(&factory)
                .await
                .expect("O3: fatal error conformance failed");
        }

        #[tokio::test]
        async fn conformance_o04_write_then_notify() {
            let factory = $factory_expr;
            $crate::tests::o04_write_then_notify::test_o04_write_then_notify(&factory)
                .await
                .expect("O4: write-then-notify conformance failed");
        }

        #[tokio::test]
        async fn conformance_o05_checkpoint_per_iteration() {
            let factory = $factory_expr;
            $crate::tests::o05_checkpoint_per_iteration::test_o05_checkpoint_per_iteration(
                &factory,
            )
            .await
            .expect("O5: checkpoint-per-iteration conformance failed");
        }

        #[tokio::test]
        async fn conformance_o06_transient_retry() {
            let factory = $factory_expr;
            $crate::tests::o06_transient_retry::test_o06_transient_retry(&factory)
                .await
                .expect("O6: transient retry conformance failed");
        }

        #[tokio::test]
        async fn conformance_o06_retry_budget_exhausted() {
            let factory = $factory_expr;
            $crate::tests::o06_transient_retry::test_o06_retry_budget_exhausted(&factory)
                .await
                .expect("O6: retry budget conformance failed");
        }

        #[tokio::test]
        async fn conformance_o07_empty_index() {
            let factory = $factory_expr;
            $crate::tests::o07_empty_index::test_o07_empty_index(&factory)
                .await
                .expect("O7: empty index conformance failed");
        }
    };
}
