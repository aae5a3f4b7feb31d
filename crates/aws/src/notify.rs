use async_trait::async_trait;
use aws_sdk_sns::Client;
use tag_inventory_storage::{Notifier, NotifyError};

use crate::classify::classify;

#[derive(Clone)]
pub struct SnsNotifier {
    client: Client,
}

impl SnsNotifier {
    pub fn new(client: Client) -> Self {
        SnsNotifier { client }
    }
}

#[async_trait]
impl Notifier for SnsNotifier {
    async fn publish(
        &self,
        topic_arn: &str,
        subject: Option<&str>,
        message: &str,
    ) -> Result<String, NotifyError> {
        let output = self
            .client
            .publish()
            .topic_arn(topic_arn)
            .set_subject(subject.map(str::to_string))
            .message(message)
            .send()
            .await
            .map_err(|err| classify(&err).into_notify_error())?;
        Ok(output.message_id().unwrap_or_default().to_string())
    }
}
