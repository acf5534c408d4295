use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lazy_loader::{LazyLoader, Phase};

#[tokio::main]
async fn main() {
   let fail = Arc::new(AtomicBool::new(true));
   let loader = LazyLoader::new({
      let fail = Arc::clone(&fail);
      move || {
         let fail = fail.load(Ordering::SeqCst);
         println!("Attempting load (fail={fail})...");
         async move {
            if fail {
               Err("Load failed!")
            } else {
               Ok("Successfully loaded".to_string())
            }
         }
      }
   });

   // First attempt fails
   match loader.request().await {
      Ok(_) => panic!("Should have failed"),
      Err(e) => println!("Caught error: {e}"),
   }
   assert_eq!(loader.phase(), Phase::Idle); // Nothing cached

   // Second attempt succeeds
   fail.store(false, Ordering::SeqCst);
   match loader.request().await {
      Ok(data) => println!("Got data: {data}"),
      Err(_) => panic!("Should have succeeded"),
   }
   assert!(loader.is_settled());

   // Later requests return the cached value, even if the producer would fail now
   fail.store(true, Ordering::SeqCst);
   match loader.request().await {
      Ok(data) => println!("Got data again: {data}"),
      Err(_) => panic!("Should have returned cached data"),
   }
   assert_eq!(loader.attempts(), 2);
}
