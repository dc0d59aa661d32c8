use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::UpstreamConfig;

fn has_proxy_env() -> bool {
    [
        "HTTPS_PROXY",
        "https_proxy",
        "HTTP_PROXY",
        "http_proxy",
        "ALL_PROXY",
        "all_proxy",
    ]
    .iter()
    .any(|k| std::env::var(k).is_ok_and(|v| !v.trim().is_empty()))
}

fn should_bypass_proxy_impl(url: &str, bypass_hosts: &[String], proxy_env_present: bool) -> bool {
    if !proxy_env_present || bypass_hosts.is_empty() {
        return false;
    }

    let Ok(u) = reqwest::Url::parse(url) else {
        return false;
    };
    let Some(host) = u.host_str() else {
        return false;
    };

    bypass_hosts.iter().map(|h| h.trim()).any(|entry| {
        let suffix = entry.trim_start_matches('.');
        !suffix.is_empty() && (host == suffix || host.ends_with(&format!(".{suffix}")))
    })
}

pub fn maybe_disable_proxy(builder: ClientBuilder, url: &str, bypass_hosts: &[String]) -> ClientBuilder {
    if should_bypass_proxy_impl(url, bypass_hosts, has_proxy_env()) {
        tracing::debug!("Bypassing proxy for {}", url);
        builder.no_proxy()
    } else {
        builder
    }
}

/// 为上游构建 HTTP 客户端：总是带超时，不允许无限等待
pub fn client_for_upstream(cfg: &UpstreamConfig) -> Result<reqwest::Client, reqwest::Error> {
    let url = cfg.chat_completions_url();
    let builder = reqwest::Client::builder().timeout(Duration::from_secs(cfg.timeout_secs));
    maybe_disable_proxy(builder, &url, &cfg.proxy_bypass_hosts).build()
}
