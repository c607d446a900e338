use bundlewatch_common::{NotificationPayload, WebhookSubscriber};

/// A payload bound to one subscriber, mention resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedNotification {
    pub subscriber: WebhookSubscriber,
    pub payload: NotificationPayload,
    /// Resolved mention text for the message `content` field. Empty for
    /// subscribers with no mention preference.
    pub content: String,
}

/// Filter subscribers by category and resolve each one's mention.
/// Input order is preserved; order only affects delivery sequence, never
/// the final ledger state.
pub fn route(
    payload: &NotificationPayload,
    category: &str,
    subscribers: &[WebhookSubscriber],
) -> Vec<RoutedNotification> {
    subscribers
        .iter()
        .filter(|s| s.categories.contains(category))
        .map(|s| RoutedNotification {
            subscriber: s.clone(),
            payload: payload.clone(),
            content: s.mention.mention_text(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundlewatch_common::MentionPolicy;
    use std::collections::HashSet;

    fn payload() -> NotificationPayload {
        NotificationPayload {
            title_text: "Alpha Bundle".to_string(),
            url: "https://x.test/games/alpha".to_string(),
            image_url: "https://x.test/logo.png".to_string(),
            expiry_relative_text: "<t:0:R>".to_string(),
            expiry_absolute_text: "<t:0:F>".to_string(),
            price_line: "**Price**: $10".to_string(),
            items_line: "One".to_string(),
            category_label: "Games".to_string(),
        }
    }

    fn subscriber(endpoint: &str, categories: &[&str], mention: MentionPolicy) -> WebhookSubscriber {
        WebhookSubscriber {
            endpoint: endpoint.to_string(),
            mention,
            categories: categories.iter().map(|c| c.to_string()).collect::<HashSet<_>>(),
            currency: "$".to_string(),
        }
    }

    #[test]
    fn filters_by_category() {
        let subs = vec![
            subscriber("https://hook/1", &["games"], MentionPolicy::None),
            subscriber("https://hook/2", &["books"], MentionPolicy::None),
            subscriber("https://hook/3", &["books", "games"], MentionPolicy::None),
        ];

        let routed = route(&payload(), "games", &subs);
        let endpoints: Vec<&str> = routed.iter().map(|r| r.subscriber.endpoint.as_str()).collect();
        assert_eq!(endpoints, vec!["https://hook/1", "https://hook/3"]);
    }

    #[test]
    fn books_subscriber_never_routed_for_games() {
        let subs = vec![subscriber("https://hook/books", &["books"], MentionPolicy::Everyone)];
        assert!(route(&payload(), "games", &subs).is_empty());
    }

    #[test]
    fn resolves_mentions_per_subscriber() {
        let subs = vec![
            subscriber("https://hook/1", &["games"], MentionPolicy::None),
            subscriber("https://hook/2", &["games"], MentionPolicy::Everyone),
            subscriber("https://hook/3", &["games"], MentionPolicy::Here),
            subscriber("https://hook/4", &["games"], MentionPolicy::Role("12345".into())),
        ];

        let routed = route(&payload(), "games", &subs);
        let contents: Vec<&str> = routed.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["", "@everyone", "@here", "<@&12345>"]);
    }

    #[test]
    fn preserves_subscriber_order() {
        let subs = vec![
            subscriber("https://hook/z", &["games"], MentionPolicy::None),
            subscriber("https://hook/a", &["games"], MentionPolicy::None),
        ];

        let routed = route(&payload(), "games", &subs);
        assert_eq!(routed[0].subscriber.endpoint, "https://hook/z");
        assert_eq!(routed[1].subscriber.endpoint, "https://hook/a");
    }

    #[test]
    fn payload_skeleton_cloned_per_subscriber() {
        let subs = vec![
            subscriber("https://hook/1", &["games"], MentionPolicy::Everyone),
            subscriber("https://hook/2", &["games"], MentionPolicy::None),
        ];

        let skeleton = payload();
        let routed = route(&skeleton, "games", &subs);
        assert!(routed.iter().all(|r| r.payload == skeleton));
    }
}
