//! Hand-written `diesel::table!` definitions for the tables §6's
//! Persistence section names as required: `payment_intents`, `charges`,
//! `refunds`, `webhooks`, `webhook_deliveries`, `api_keys`, `merchants`.
//! Row-level security, where present, is enforced by the server-side
//! merchant-context guard (§6) rather than by anything diesel generates.

diesel::table! {
    merchants (id) {
        id -> Uuid,
        routing_config -> Jsonb,
    }
}

diesel::table! {
    api_keys (id) {
        id -> Uuid,
        merchant_id -> Uuid,
        key_type -> Text,
        lookup_value -> Text,
        is_active -> Bool,
        last_used_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    payment_intents (id) {
        id -> Uuid,
        merchant_id -> Uuid,
        customer_id -> Nullable<Uuid>,
        amount -> Int8,
        currency -> Text,
        capture_method -> Text,
        confirmation_method -> Text,
        status -> Text,
        payment_method -> Nullable<Jsonb>,
        acquirer_routing -> Jsonb,
        metadata -> Jsonb,
        description -> Nullable<Text>,
        created_at -> Timestamptz,
        modified_at -> Timestamptz,
    }
}

diesel::table! {
    charges (id) {
        id -> Uuid,
        merchant_id -> Uuid,
        payment_intent_id -> Uuid,
        amount_authorized -> Int8,
        amount_captured -> Int8,
        amount_refunded -> Int8,
        currency -> Text,
        status -> Text,
        acquirer_name -> Text,
        acquirer_reference -> Nullable<Text>,
        authorization_code -> Nullable<Text>,
        network -> Nullable<Text>,
        processor_response -> Jsonb,
        created_at -> Timestamptz,
        modified_at -> Timestamptz,
    }
}

diesel::table! {
    refunds (id) {
        id -> Uuid,
        merchant_id -> Uuid,
        charge_id -> Uuid,
        amount -> Int8,
        currency -> Text,
        reason -> Nullable<Text>,
        status -> Text,
        acquirer_reference -> Nullable<Text>,
        created_at -> Timestamptz,
        modified_at -> Timestamptz,
    }
}

diesel::table! {
    webhooks (id) {
        id -> Uuid,
        merchant_id -> Uuid,
        url -> Text,
        secret -> Text,
        events -> Array<Text>,
        is_active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    webhook_deliveries (id) {
        id -> Uuid,
        merchant_id -> Uuid,
        event_type -> Text,
        event_id -> Uuid,
        endpoint_url -> Text,
        payload -> Jsonb,
        attempt -> Int4,
        max_attempts -> Int4,
        status_code -> Nullable<Int4>,
        response_body -> Nullable<Text>,
        error -> Nullable<Text>,
        next_retry_at -> Timestamptz,
        delivered -> Bool,
        delivered_at -> Nullable<Timestamptz>,
        status -> Text,
    }
}
