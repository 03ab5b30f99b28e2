//! Routes decoded jobs to their handlers and normalizes outcomes into
//! reply frames.

use log::{debug, warn};
use wire::{ErrorReport, Job, JobResult, Operation, Reply};

use crate::{
    context::WorkerContext,
    error::{Result, WorkerErr},
};

/// Dispatches one job to its handler.
///
/// Unknown operations are logged and dropped without a reply; the broker
/// must detect those via its own job timeout. For every recognized
/// operation exactly one reply comes back: a result on success, an error
/// report carrying the originating job id on any handler failure. No
/// handler failure propagates out of this function.
pub async fn dispatch(job: Job, ctx: &mut WorkerContext) -> Option<Reply> {
    let Job { job_id, op } = job;

    if let Operation::Unknown(name) = &op {
        warn!("unknown operation, dropping job: job_id={job_id} operation={name}");
        return None;
    }

    debug!(job_id = job_id.as_str(), operation = op.name(); "handling job");

    let reply = match run_handler(op, ctx).await {
        Ok(data) => {
            debug!(job_id = job_id.as_str(), result_len = data.len(); "job finished");
            Reply::Result(JobResult { job_id, data })
        }
        Err(err) => {
            warn!("job failed: job_id={job_id} error={err}");
            Reply::Error(ErrorReport {
                job_id,
                error: err.to_string(),
            })
        }
    };

    Some(reply)
}

async fn run_handler(op: Operation, ctx: &mut WorkerContext) -> Result<Vec<f32>> {
    match op {
        Operation::SquareArray { array } => Ok(ctx.gpu.square_array(&array).await?),
        Operation::OnnxInference { input_data } => Ok(ctx.model.infer(&input_data)?),
        Operation::LoadOnnxModel { onnx_model_b64 } => {
            ctx.model.load_base64(&onnx_model_b64)?;
            // Loads have no numeric output; an empty result acknowledges
            // completion so the broker is not left waiting.
            Ok(Vec::new())
        }
        // Reserved for a non-accelerator model path.
        Operation::LoadModel => Err(WorkerErr::UnsupportedOperation("load_model")),
        Operation::Inference => Err(WorkerErr::UnsupportedOperation("inference")),
        Operation::Unknown(_) => unreachable!("filtered by dispatch"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{EngineErr, ModelRuntime, ModelSession, Tensor};

    /// Runtime whose sessions echo their input doubled.
    struct DoublingRuntime;

    struct DoublingSession;

    impl ModelRuntime for DoublingRuntime {
        fn load(&self, _bytes: &[u8]) -> engine::Result<Box<dyn ModelSession>> {
            Ok(Box::new(DoublingSession))
        }
    }

    impl ModelSession for DoublingSession {
        fn run(&self, input: &Tensor) -> engine::Result<Vec<(String, Tensor)>> {
            let doubled = Tensor {
                data: input.data.iter().map(|v| v * 2.0).collect(),
                dims: input.dims.clone(),
            };
            Ok(vec![("output".to_string(), doubled)])
        }
    }

    /// Runtime that rejects every load.
    struct RejectingRuntime;

    impl ModelRuntime for RejectingRuntime {
        fn load(&self, _bytes: &[u8]) -> engine::Result<Box<dyn ModelSession>> {
            Err(EngineErr::ModelLoad("rejected by runtime".to_string()))
        }
    }

    fn job(id: &str, op: Operation) -> Job {
        Job {
            job_id: id.to_string(),
            op,
        }
    }

    #[tokio::test]
    async fn unknown_operation_produces_no_reply() {
        let mut ctx = WorkerContext::new(Box::new(DoublingRuntime));

        let reply = dispatch(job("9", Operation::Unknown("bogus".to_string())), &mut ctx).await;
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn inference_before_load_is_an_error_report() {
        let mut ctx = WorkerContext::new(Box::new(DoublingRuntime));

        let reply = dispatch(
            job(
                "7",
                Operation::OnnxInference {
                    input_data: vec![vec![1.0, 2.0]],
                },
            ),
            &mut ctx,
        )
        .await
        .expect("known operation always replies");

        match reply {
            Reply::Error(report) => {
                assert_eq!(report.job_id, "7");
                assert!(!report.error.is_empty());
            }
            other => panic!("expected error report, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn load_then_inference_succeeds() {
        let mut ctx = WorkerContext::new(Box::new(DoublingRuntime));

        // "AQID" decodes to [1, 2, 3]; the mock accepts anything.
        let reply = dispatch(
            job(
                "1",
                Operation::LoadOnnxModel {
                    onnx_model_b64: "AQID".to_string(),
                },
            ),
            &mut ctx,
        )
        .await
        .expect("load replies");
        assert_eq!(
            reply,
            Reply::Result(JobResult {
                job_id: "1".to_string(),
                data: vec![],
            })
        );

        let reply = dispatch(
            job(
                "2",
                Operation::OnnxInference {
                    input_data: vec![vec![1.0, 2.0], vec![3.0, 4.0]],
                },
            ),
            &mut ctx,
        )
        .await
        .expect("inference replies");
        assert_eq!(
            reply,
            Reply::Result(JobResult {
                job_id: "2".to_string(),
                data: vec![2.0, 4.0, 6.0, 8.0],
            })
        );
    }

    #[tokio::test]
    async fn rejected_load_is_an_error_report() {
        let mut ctx = WorkerContext::new(Box::new(RejectingRuntime));

        let reply = dispatch(
            job(
                "3",
                Operation::LoadOnnxModel {
                    onnx_model_b64: "AQID".to_string(),
                },
            ),
            &mut ctx,
        )
        .await
        .expect("load replies");

        match reply {
            Reply::Error(report) => {
                assert_eq!(report.job_id, "3");
                assert!(report.error.contains("rejected by runtime"));
            }
            other => panic!("expected error report, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reserved_operations_report_unsupported() {
        let mut ctx = WorkerContext::new(Box::new(DoublingRuntime));

        for (id, op) in [("4", Operation::LoadModel), ("5", Operation::Inference)] {
            let reply = dispatch(job(id, op), &mut ctx).await.expect("replies");
            match reply {
                Reply::Error(report) => {
                    assert_eq!(report.job_id, id);
                    assert!(report.error.contains("reserved"));
                }
                other => panic!("expected error report, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn ragged_inference_input_is_an_error_report() {
        let mut ctx = WorkerContext::new(Box::new(DoublingRuntime));
        dispatch(
            job(
                "1",
                Operation::LoadOnnxModel {
                    onnx_model_b64: "AQID".to_string(),
                },
            ),
            &mut ctx,
        )
        .await
        .expect("load replies");

        let reply = dispatch(
            job(
                "6",
                Operation::OnnxInference {
                    input_data: vec![vec![1.0, 2.0], vec![3.0]],
                },
            ),
            &mut ctx,
        )
        .await
        .expect("inference replies");

        match reply {
            Reply::Error(report) => assert!(report.error.contains("ragged")),
            other => panic!("expected error report, got {other:?}"),
        }
    }
}
