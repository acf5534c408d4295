use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lazy_loader::LazyLoader;
use tokio::time::{sleep, Duration};

#[tokio::main]
async fn main() {
   let counter = Arc::new(AtomicUsize::new(0));
   let loader = LazyLoader::new({
      let counter = Arc::clone(&counter);
      move || {
         // This runs only once
         counter.fetch_add(1, Ordering::Relaxed);
         println!("Loading expensive data...");
         async {
            sleep(Duration::from_millis(50)).await;
            Ok::<_, String>(Arc::new("Async expensive data".to_string()))
         }
      }
   });

   let tasks: Vec<_> = (0..5)
      .map(|i| {
         let loader = loader.clone();
         tokio::spawn(async move {
            match loader.request().await {
               Ok(data) => println!("Task {i}: {data}"),
               Err(e) => println!("Task {i} failed: {e}"),
            }
         })
      })
      .collect();

   for t in tasks {
      t.await.unwrap();
   }

   assert_eq!(loader.get().map(|s| s.as_str()), Some("Async expensive data"));
   assert_eq!(counter.load(Ordering::Relaxed), 1); // Producer ran only once
   println!("Cached: {:?}", loader.request().await);
}
