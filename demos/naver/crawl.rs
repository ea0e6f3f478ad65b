use naver_webtoon_crawler::platform::naver::{Client, errors::Error};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("naver_webtoon_crawler=info")),
        )
        .init();

    let client = Client::builder().root("demos/naver-webtoon-data").build()?;

    for entry in client.search("탑").await? {
        println!("{} => {}", entry.title(), entry.id());
    }

    let Some(webtoon) = client.webtoon("신의 탑", true).await? else {
        panic!("webtoon is not on the listing page");
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&webtoon.episodes().first())
            .expect("episodes should serialize")
    );

    let report = client.download_range(&webtoon, 1, 2, false).await?;
    println!("{report:?}");

    Ok(())
}
