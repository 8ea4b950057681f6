pub mod coupon_service;
pub mod email_service;
pub mod queue_service;
pub mod stripe_webhook_service;

#[cfg(test)]
pub mod recording;
