//! Contact-list provider client.

use crate::core::identity::UserIdentity;
use crate::utils::url::construct_api_url;

/// Fetch the contact list for `user_id` from `{base}/{user_id}`.
///
/// Failures are recoverable by the caller: the shell logs them and keeps an
/// empty contact list rather than blocking the UI.
pub async fn fetch_contacts(
    client: &reqwest::Client,
    base_url: &str,
    user_id: &str,
) -> Result<Vec<UserIdentity>, Box<dyn std::error::Error + Send + Sync>> {
    let contacts_url = construct_api_url(base_url, user_id);
    let response = client
        .get(contacts_url)
        .header("Content-Type", "application/json")
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(format!("Contact request failed with status {status}: {error_text}").into());
    }

    let contacts = response.json::<Vec<UserIdentity>>().await?;
    Ok(contacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a local port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn fetches_and_decodes_the_contact_list() {
        let base_url = serve_once(
            "200 OK",
            r#"[{"_id":"u2","username":"bob","email":"b@x.com","avatarImage":""}]"#,
        )
        .await;
        let client = reqwest::Client::new();

        let contacts = fetch_contacts(&client, &base_url, "u1").await.unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].id, "u2");
        assert_eq!(contacts[0].username, "bob");
    }

    #[tokio::test]
    async fn server_error_surfaces_as_a_recoverable_error() {
        let base_url = serve_once("500 Internal Server Error", "oops").await;
        let client = reqwest::Client::new();

        let err = fetch_contacts(&client, &base_url, "u1")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn unreachable_server_surfaces_as_a_recoverable_error() {
        // Bind-then-drop guarantees nothing is listening on the port.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let client = reqwest::Client::new();

        assert!(fetch_contacts(&client, &base_url, "u1").await.is_err());
    }
}
