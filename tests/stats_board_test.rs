//! Statistics Board Integration Tests
//!
//! Loading, fallback and retry against a mock backend.

#[cfg(test)]
mod tests {
    use dataset_uploadr::api::{ChestXrayStats, HttpApiClient, TinyImageNetStats};
    use dataset_uploadr::config::ApiConfig;
    use dataset_uploadr::stats::StatsBoard;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_board(server: &MockServer) -> StatsBoard<HttpApiClient> {
        let config = ApiConfig {
            base_url: server.uri(),
            timeout_seconds: 5,
        };
        StatsBoard::new(HttpApiClient::new(&config).unwrap())
    }

    fn tiny_imagenet_body() -> serde_json::Value {
        json!({
            "total_images": 110000,
            "total_classes": 200,
            "training_images": 100000,
            "validation_images": 10000,
            "test_images": 0,
            "distribution": []
        })
    }

    #[tokio::test]
    async fn test_load_uses_backend_figures() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/datasets/chest-xray/statistics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_images": 100,
                "normal_cases": 40,
                "pneumonia_cases": 60,
                "distribution": []
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/datasets/tiny-imagenet/statistics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tiny_imagenet_body()))
            .mount(&mock_server)
            .await;

        let mut board = create_board(&mock_server);
        board.load().await;

        assert!(!board.is_fallback());
        assert_eq!(board.chest_xray().unwrap().pneumonia_cases, 60);
        assert_eq!(board.tiny_imagenet().unwrap().test_images, 0);
    }

    #[tokio::test]
    async fn test_one_failed_request_shows_reference_figures() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/datasets/chest-xray/statistics"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/datasets/tiny-imagenet/statistics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tiny_imagenet_body()))
            .mount(&mock_server)
            .await;

        let mut board = create_board(&mock_server);
        board.load().await;

        assert!(board.is_fallback());
        assert_eq!(
            board.error(),
            Some("API request failed: Internal Server Error")
        );
        assert_eq!(board.chest_xray(), Some(&ChestXrayStats::reference()));
        assert_eq!(board.tiny_imagenet(), Some(&TinyImageNetStats::reference()));

        let view = serde_json::to_value(board.view()).unwrap();
        assert_eq!(view["fallback"], json!(true));
        assert_eq!(view["chest_xray"]["total_images"], json!(5856));
    }

    #[tokio::test]
    async fn test_unreachable_backend_falls_back() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout_seconds: 1,
        };
        let mut board = StatsBoard::new(HttpApiClient::new(&config).unwrap());

        board.load().await;
        board.retry().await;

        assert!(board.is_fallback());
        assert_eq!(board.retry_count(), 1);
        assert_eq!(board.tiny_imagenet().unwrap().total_classes, 200);
    }
}
