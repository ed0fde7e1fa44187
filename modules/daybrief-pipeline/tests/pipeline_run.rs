//! End-to-end pipeline runs against mocked external services: Serper, the
//! OpenAI chat endpoint, the scraping proxy (pages and Reddit), and Resend.

use wiremock::matchers::{body_string_contains, method, path, query_param, query_param_contains};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ai_client::OpenAi;
use daybrief_common::DigestConfig;
use daybrief_pipeline::compose::SectionComposer;
use daybrief_pipeline::pipeline::{Deps, Pipeline, RunOptions};
use daybrief_pipeline::reddit::{ProxyTransport, RedditClient};
use daybrief_pipeline::relevance::RelevanceFilter;
use daybrief_pipeline::scrape::{ContentFetcher, ScrapingFishScraper};
use daybrief_pipeline::search::SerperSearcher;
use daybrief_pipeline::summarize::Summarizer;
use resend_client::ResendClient;
use scrapingfish_client::ScrapingFishClient;

fn chat_content(content: &str) -> serde_json::Value {
    serde_json::json!({"choices": [{"message": {"content": content}}]})
}

struct Harness {
    _serper: MockServer,
    openai: MockServer,
    _proxy: MockServer,
    resend: MockServer,
    scraped_dir: tempfile::TempDir,
    summaries_dir: tempfile::TempDir,
    deps: Deps,
}

async fn harness() -> Harness {
    let serper = MockServer::start().await;
    let openai = MockServer::start().await;
    let proxy = MockServer::start().await;
    let resend = MockServer::start().await;

    // Serper: two candidates for any topic query.
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "organic": [
                {"title": "Skipped Story", "link": "https://news.test/article-1", "snippet": "s1"},
                {"title": "Big News", "link": "https://news.test/article-2", "snippet": "s2"}
            ]
        })))
        .mount(&serper)
        .await;

    // Relevance filter keeps only id 2.
    Mock::given(method("POST"))
        .and(body_string_contains("relevant_results"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_content(
            r#"{"relevant_results": [{"explanation": "substantive", "id": "2"}]}"#,
        )))
        .mount(&openai)
        .await;

    // Page summaries.
    Mock::given(method("POST"))
        .and(body_string_contains("summarising one scraped article"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_content("A tight summary.")))
        .mount(&openai)
        .await;

    // Topic and Reddit section composition.
    Mock::given(method("POST"))
        .and(body_string_contains("email digest for the topic"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_content(
            r#"{"html_section": "<h2><b>AI Agents</b></h2><ul><li>item</li></ul>"}"#,
        )))
        .mount(&openai)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("digest for Reddit keyword"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_content(
            r#"{"html_section": "<h2>Keyword: \"AI agents\"</h2>"}"#,
        )))
        .mount(&openai)
        .await;

    // Proxy, page scrape: render_js is set only for article fetches.
    Mock::given(method("GET"))
        .and(query_param("render_js", "true"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<h1>Big News</h1><p>Body text.</p>"),
        )
        .mount(&proxy)
        .await;

    // Proxy, Reddit search listing.
    Mock::given(method("GET"))
        .and(query_param_contains("url", "search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"children": [{
                "kind": "t3",
                "data": {
                    "title": "Agents thread",
                    "permalink": "/r/LocalLLaMA/comments/abc/agents_thread/",
                    "score": 120,
                    "num_comments": 30,
                    "subreddit": "LocalLLaMA",
                    "selftext": "thread body"
                }
            }]}
        })))
        .mount(&proxy)
        .await;

    // Proxy, Reddit comment listing.
    Mock::given(method("GET"))
        .and(query_param_contains("url", "/comments/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"data": {"children": [{"kind": "t3", "data": {"title": "Agents thread"}}]}},
            {"data": {"children": [
                {"kind": "t1", "data": {"author": "u1", "score": 10, "body": "low"}},
                {"kind": "t1", "data": {"author": "u2", "score": 90, "body": "high"}}
            ]}}
        ])))
        .mount(&proxy)
        .await;

    let model = OpenAi::new("sk-test", "gpt-4o-mini").with_base_url(openai.uri());
    let scraped_dir = tempfile::tempdir().unwrap();
    let summaries_dir = tempfile::tempdir().unwrap();

    let deps = Deps {
        searcher: Box::new(SerperSearcher::new("serper-key").with_endpoint(&serper.uri())),
        relevance: RelevanceFilter::new(model.clone()),
        fetcher: ContentFetcher::new(
            Box::new(ScrapingFishScraper::new(
                ScrapingFishClient::new("fish-key").with_api_url(&proxy.uri()),
            )),
            scraped_dir.path(),
        ),
        summarizer: Summarizer::new(model.clone(), summaries_dir.path()),
        reddit: RedditClient::new(Box::new(ProxyTransport::new(
            ScrapingFishClient::new("fish-key").with_api_url(&proxy.uri()),
        ))),
        composer: SectionComposer::new(model.clone()),
        review: None,
        mailer: ResendClient::new("re-key").with_base_url(&resend.uri()),
    };

    Harness {
        _serper: serper,
        openai,
        _proxy: proxy,
        resend,
        scraped_dir,
        summaries_dir,
        deps,
    }
}

fn digest() -> DigestConfig {
    serde_json::from_str(
        r#"{
            "topics": [{"term": "agentic AI systems", "category": "AI Agents"}],
            "reddit_keywords": [{"keyword": "AI agents", "subreddit": "LocalLLaMA"}]
        }"#,
    )
    .unwrap()
}

fn opts(dry_run: bool) -> RunOptions {
    RunOptions {
        quick: false,
        dry_run,
        max_results: 3,
        destination: "reader@example.test".to_string(),
    }
}

#[tokio::test]
async fn dry_run_produces_a_digest_without_sending() {
    let h = harness().await;
    let pipeline = Pipeline::new(h.deps);

    let html = pipeline.run(&digest(), &opts(true)).await.unwrap();

    assert!(html.contains("Daybrief Daily Digest"));
    assert!(html.contains("<h2><b>AI Agents</b></h2>"));
    assert!(html.contains("<h1>Reddit Digest</h1>"));
    assert!(html.contains("Keyword: \"AI agents\""));

    // Only the relevant result was scraped and summarized, keyed by its id.
    assert!(!h.scraped_dir.path().join("1.md").exists());
    let page = std::fs::read_to_string(h.scraped_dir.path().join("2.md")).unwrap();
    assert_eq!(page, "# Big News\n\nBody text.");
    let summary = std::fs::read_to_string(h.summaries_dir.path().join("summary_2.md")).unwrap();
    assert_eq!(summary, "A tight summary.");

    // Dry run: nothing reached Resend.
    assert!(h.resend.received_requests().await.unwrap().is_empty());

    // Four model calls: relevance, summary, topic section, Reddit section.
    assert_eq!(h.openai.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn live_run_delivers_through_resend() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "em_1"})),
        )
        .expect(1)
        .mount(&h.resend)
        .await;

    let pipeline = Pipeline::new(h.deps);
    pipeline.run(&digest(), &opts(false)).await.unwrap();

    let requests = h.resend.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["to"][0], "reader@example.test");
    assert!(body["subject"].as_str().unwrap().starts_with("Daybrief Daily Digest - "));
}

#[tokio::test]
async fn delivery_failure_does_not_fail_the_run() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(500).set_body_string("smtp down"))
        .mount(&h.resend)
        .await;

    let pipeline = Pipeline::new(h.deps);
    let html = pipeline.run(&digest(), &opts(false)).await.unwrap();
    assert!(html.contains("Daybrief Daily Digest"));
}
