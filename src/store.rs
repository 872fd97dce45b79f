use std::future::Future;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::config::normalize_base_url;
use crate::error::{TransportError, TransportResult};
use crate::model::{Todo, TodoId, TodoPayload};

/// Where todos live. The app only ever talks to the server through this.
pub trait TodoStore: Send + Sync + 'static {
    fn list(&self) -> impl Future<Output = TransportResult<Vec<Todo>>> + Send;

    /// The server assigns the id and returns the stored record.
    fn create(&self, payload: &TodoPayload) -> impl Future<Output = TransportResult<Todo>> + Send;

    /// Returns the authoritative record after the update.
    fn update(
        &self,
        id: &TodoId,
        payload: &TodoPayload,
    ) -> impl Future<Output = TransportResult<Todo>> + Send;

    fn delete(&self, id: &TodoId) -> impl Future<Output = TransportResult<()>> + Send;
}

/// JSON over HTTP: `GET`/`POST` on the base URL, `PUT`/`DELETE` on
/// `<base>/<id>`.
#[derive(Debug, Clone)]
pub struct HttpTodoStore {
    base_url: String,
    http: Client,
}

impl HttpTodoStore {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(concat!("todo-studio/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: normalize_base_url(base_url),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn item_url(&self, id: &TodoId) -> String {
        format!("{}/{}", self.base_url, id)
    }
}

async fn dispatch(method: &'static str, url: &str, request: RequestBuilder) -> TransportResult<Response> {
    tracing::debug!("{method} {url}");
    let response = request.send().await.map_err(|source| TransportError::Request {
        method,
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::Status {
            method,
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}

async fn decode<T: DeserializeOwned>(method: &'static str, url: &str, response: Response) -> TransportResult<T> {
    response.json::<T>().await.map_err(|source| TransportError::Decode {
        method,
        url: url.to_string(),
        source,
    })
}

impl TodoStore for HttpTodoStore {
    async fn list(&self) -> TransportResult<Vec<Todo>> {
        let url = self.base_url.as_str();
        let response = dispatch("GET", url, self.http.get(url)).await?;
        let todos: Vec<Todo> = decode("GET", url, response).await?;
        tracing::info!("fetched {} todos", todos.len());
        Ok(todos)
    }

    async fn create(&self, payload: &TodoPayload) -> TransportResult<Todo> {
        let url = self.base_url.as_str();
        let response = dispatch("POST", url, self.http.post(url).json(payload)).await?;
        decode("POST", url, response).await
    }

    async fn update(&self, id: &TodoId, payload: &TodoPayload) -> TransportResult<Todo> {
        let url = self.item_url(id);
        let response = dispatch("PUT", &url, self.http.put(&url).json(payload)).await?;
        decode("PUT", &url, response).await
    }

    async fn delete(&self, id: &TodoId) -> TransportResult<()> {
        let url = self.item_url(id);
        dispatch("DELETE", &url, self.http.delete(&url)).await?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::memory::MemoryStore;
    use super::*;
    use crate::model::PayloadBuilder;

    /// Answers a single request with a canned JSON response and returns the
    /// base URL to point a store at.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                let read = stream.read(&mut chunk).unwrap();
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..read]);
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{addr}/api/todos")
    }

    #[test]
    fn item_urls_hang_off_the_base() {
        let store = HttpTodoStore::new("http://localhost:8081/api/todos/").unwrap();
        assert_eq!(store.base_url(), "http://localhost:8081/api/todos");
        assert_eq!(store.item_url(&TodoId::Number(42)), "http://localhost:8081/api/todos/42");
        assert_eq!(store.item_url(&TodoId::from("a1")), "http://localhost:8081/api/todos/a1");
    }

    #[tokio::test]
    async fn unreachable_server_is_a_request_error() {
        let store = HttpTodoStore::new("http://127.0.0.1:9/api/todos").unwrap();
        let err = store.list().await.unwrap_err();
        assert!(matches!(err, TransportError::Request { method: "GET", .. }), "{err}");
    }

    #[tokio::test]
    async fn server_error_is_a_status_error() {
        let store = HttpTodoStore::new(&serve_once("500 Internal Server Error", "{}")).unwrap();
        let err = store.list().await.unwrap_err();
        assert!(
            matches!(err, TransportError::Status { method: "GET", status: 500, .. }),
            "{err}"
        );
    }

    #[tokio::test]
    async fn missing_record_on_delete_is_a_status_error() {
        let store = HttpTodoStore::new(&serve_once("404 Not Found", "")).unwrap();
        let err = store.delete(&TodoId::Number(7)).await.unwrap_err();
        assert!(
            matches!(&err, TransportError::Status { method: "DELETE", status: 404, url } if url.ends_with("/api/todos/7")),
            "{err}"
        );
    }

    #[tokio::test]
    async fn non_array_list_is_a_decode_error() {
        let store = HttpTodoStore::new(&serve_once("200 OK", r#"{"not":"array"}"#)).unwrap();
        let err = store.list().await.unwrap_err();
        assert!(matches!(err, TransportError::Decode { method: "GET", .. }), "{err}");
    }

    #[tokio::test]
    async fn listed_priorities_are_normalized() {
        let body = r#"[
            {"id": 1, "todoNm": "Loud", "priority": "9", "achievement": 1},
            {"id": "b2", "todoNm": "Quiet", "priority": 0},
            {"id": 3, "todoNm": "Unset", "priority": null, "dueDate": null}
        ]"#;
        let store = HttpTodoStore::new(&serve_once("200 OK", body)).unwrap();
        let todos = store.list().await.unwrap();

        let priorities: Vec<u8> = todos.iter().map(|todo| todo.priority.value()).collect();
        assert_eq!(priorities, [5, 1, 3]);
        assert_eq!(todos[1].id, TodoId::from("b2"));
        assert!(todos[0].achievement);
        assert_eq!(todos[2].due_date, None);
    }

    #[tokio::test]
    async fn created_record_comes_back_from_the_server() {
        let body = r#"{"id": 11, "todoNm": "Water plants", "priority": 2, "achievement": false}"#;
        let store = HttpTodoStore::new(&serve_once("201 Created", body)).unwrap();
        let created = store
            .create(&PayloadBuilder::new().todo_nm("Water plants").build())
            .await
            .unwrap();
        assert_eq!(created.id, TodoId::Number(11));
        assert_eq!(created.priority.value(), 2);
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryStore::with(vec![]);
        let created = store
            .create(&PayloadBuilder::new().todo_nm("Water plants").build())
            .await
            .unwrap();
        assert_eq!(created.id, TodoId::Number(1));

        let payload = PayloadBuilder::from(&created).achievement(true).build();
        let updated = store.update(&created.id, &payload).await.unwrap();
        assert!(updated.achievement);

        store.delete(&created.id).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
        assert!(matches!(
            store.delete(&created.id).await,
            Err(TransportError::Status { status: 404, .. })
        ));
    }
}
