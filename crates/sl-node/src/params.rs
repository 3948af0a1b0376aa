//! Parameter service: set and read a node's live parameters from other tasks.
//!
//! Requests are queued to the owning node and answered between its other
//! callbacks, so an update is visible to the next control step that starts
//! after the reply.

use sl_controls::{Parameter, Parameterized, SetParametersResult};
use tokio::sync::{mpsc, oneshot};

use crate::error::{NodeError, NodeResult};

/// A request addressed to a node's parameter handler.
#[derive(Debug)]
pub enum ParamRequest {
    Set {
        params: Vec<Parameter>,
        reply: oneshot::Sender<SetParametersResult>,
    },
    Get {
        reply: oneshot::Sender<Vec<Parameter>>,
    },
}

impl ParamRequest {
    /// Answer this request against `component`.
    pub fn handle(self, component: &mut impl Parameterized) {
        // A caller that stopped waiting is not the node's problem.
        match self {
            ParamRequest::Set { params, reply } => {
                let _ = reply.send(component.set_parameters(&params));
            }
            ParamRequest::Get { reply } => {
                let _ = reply.send(component.parameters());
            }
        }
    }
}

/// Cloneable handle for talking to one node's parameters.
#[derive(Debug, Clone)]
pub struct ParamClient {
    node: String,
    tx: mpsc::Sender<ParamRequest>,
}

impl ParamClient {
    /// Create a client and the receiver its node should poll.
    pub fn channel(node: &str) -> (Self, mpsc::Receiver<ParamRequest>) {
        let (tx, rx) = mpsc::channel(16);
        (
            Self {
                node: node.to_string(),
                tx,
            },
            rx,
        )
    }

    /// Apply `params` in order; the node stops at the first rejection.
    pub async fn set_parameters(&self, params: Vec<Parameter>) -> NodeResult<SetParametersResult> {
        let (reply, response) = oneshot::channel();
        self.send(ParamRequest::Set { params, reply }).await?;
        response.await.map_err(|_| self.stopped())
    }

    pub async fn set_parameter(&self, name: &str, value: f64) -> NodeResult<SetParametersResult> {
        self.set_parameters(vec![Parameter::new(name, value)]).await
    }

    pub async fn get_parameters(&self) -> NodeResult<Vec<Parameter>> {
        let (reply, response) = oneshot::channel();
        self.send(ParamRequest::Get { reply }).await?;
        response.await.map_err(|_| self.stopped())
    }

    async fn send(&self, request: ParamRequest) -> NodeResult<()> {
        self.tx.send(request).await.map_err(|_| self.stopped())
    }

    fn stopped(&self) -> NodeError {
        NodeError::NodeStopped {
            node: self.node.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sl_controls::{ReferenceSignal, SignalGenerator, TYPE_FLAG, Waveform};

    #[tokio::test]
    async fn requests_are_answered_against_the_component() {
        let (client, mut rx) = ParamClient::channel("generator");
        let mut generator = SignalGenerator::new(ReferenceSignal::default(), Waveform::Sinusoid);

        let server = tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                request.handle(&mut generator);
            }
            generator.mode()
        });

        let result = client.set_parameter(TYPE_FLAG, 1.0).await.unwrap();
        assert!(result.successful);
        let rejected = client.set_parameter(TYPE_FLAG, 2.0).await.unwrap();
        assert!(!rejected.successful);
        assert_eq!(
            client.get_parameters().await.unwrap(),
            vec![Parameter::new(TYPE_FLAG, 1.0)]
        );

        drop(client);
        assert_eq!(server.await.unwrap(), Waveform::Square);
    }

    #[tokio::test]
    async fn stopped_node_reports_error() {
        let (client, rx) = ParamClient::channel("controller");
        drop(rx);
        let err = client.set_parameter("kp", 0.5).await.unwrap_err();
        assert!(matches!(err, NodeError::NodeStopped { ref node } if node == "controller"));
    }
}
