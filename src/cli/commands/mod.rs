pub mod invoke;
pub mod serve;

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::gateway::RequestRouter;
use crate::queue::ChannelQueue;
use crate::services::Dependencies;
use crate::worker::{LogNotifier, NotificationWorker};

/// Router on local collaborators plus the worker draining its notification queue.
///
/// The worker stops once the router (the last queue sender) is dropped.
pub fn local_stack(config: &AppConfig) -> anyhow::Result<(RequestRouter, JoinHandle<()>)> {
    let (queue, rx) = ChannelQueue::new();
    let deps = Dependencies::local(config, Arc::new(queue))?;
    let router = RequestRouter::new(deps, config)?;

    let worker = NotificationWorker::new(LogNotifier::new(config.notifications.topic_arn.clone()));
    let handle = tokio::spawn(worker.run(rx));

    Ok((router, handle))
}
