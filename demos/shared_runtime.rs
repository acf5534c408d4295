use std::thread;

use lazy_loader::LazyLoader;
use tokio::runtime::Builder;
use tokio::time::{sleep, Duration};

fn main() {
   let runtime = Builder::new_multi_thread()
      .worker_threads(2)
      .enable_time()
      .build()
      .expect("failed to build runtime");

   // Production cycles run on `runtime`, so plain threads can request too
   let loader = LazyLoader::with_handle(runtime.handle().clone(), || async {
      sleep(Duration::from_millis(20)).await;
      Ok::<_, String>(String::from("loaded on the shared runtime"))
   });

   let threads: Vec<_> = (0..4)
      .map(|i| {
         let loader = loader.clone();
         thread::spawn(move || (i, loader.request()))
      })
      .collect();

   for t in threads {
      let (i, request) = t.join().unwrap();
      println!("Thread {i}: {:?}", runtime.block_on(request));
   }
   assert_eq!(loader.attempts(), 1);
}
