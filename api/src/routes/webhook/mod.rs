pub mod github_webhook_route;
