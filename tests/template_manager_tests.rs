#[cfg(test)]
mod tests {
    use graphdash::app::graphui::TemplateManager;
    use graphdash::app::notifications::{NotificationManager, NotificationType};
    use graphdash::app::resources::{TemplateClient, TemplateRoutes};
    use graphdash::app::server_api::ServerApi;
    use graphdash::app::workflow::{prompt_list_node, NodeId, WorkflowGraph};
    use mockito::Matcher;
    use serde_json::json;
    use std::time::{Duration, Instant};

    /// Poll the manager until `done` holds or the timeout expires. Returns
    /// whether the condition was reached.
    fn pump(
        manager: &mut TemplateManager,
        graph: &mut WorkflowGraph,
        notifications: &mut NotificationManager,
        mut done: impl FnMut(&WorkflowGraph, &NotificationManager, &TemplateManager) -> bool,
    ) -> bool {
        let start = Instant::now();
        while start.elapsed() < Duration::from_secs(5) {
            manager.poll(graph, notifications);
            if done(graph, notifications, manager) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }

    fn setup(server: &mockito::ServerGuard) -> (TemplateManager, WorkflowGraph, NotificationManager, NodeId) {
        let api = ServerApi::new(&server.url()).unwrap();
        let manager = TemplateManager::new(TemplateClient::new(api, TemplateRoutes::easyuse()));
        let mut graph = WorkflowGraph::new();
        let node = graph.add(|id| prompt_list_node(id, (0.0, 0.0)));
        (manager, graph, NotificationManager::new(), node)
    }

    fn select_template(graph: &mut WorkflowGraph, node: NodeId, name: &str) {
        let widget = graph
            .node_mut(node)
            .unwrap()
            .widget_mut("template_file")
            .unwrap();
        widget.set_options(vec!["None".to_string(), name.to_string()], "None");
        widget.select(name);
    }

    fn set_save_name(graph: &mut WorkflowGraph, node: NodeId, text: &str) {
        graph
            .node_mut(node)
            .unwrap()
            .widget_mut("save_filename")
            .unwrap()
            .set_text(text);
    }

    fn options_of(graph: &WorkflowGraph, node: NodeId) -> Vec<String> {
        graph
            .node(node)
            .unwrap()
            .widget("template_file")
            .unwrap()
            .options
            .clone()
    }

    #[test]
    fn refresh_populates_the_dropdown() {
        let mut server = mockito::Server::new();
        let _list = server
            .mock("GET", "/easyuse/get_prompt_lists")
            .with_status(200)
            .with_body(r#"["None", "a.json", "b.json"]"#)
            .create();

        let (mut manager, mut graph, mut notifications, node) = setup(&server);
        manager.request_refresh(node);

        assert!(pump(&mut manager, &mut graph, &mut notifications, |g, _, _| {
            options_of(g, node) == vec!["None", "a.json", "b.json"]
        }));
        // Nothing was selected before, so the placeholder stays selected.
        assert_eq!(
            graph
                .node(node)
                .unwrap()
                .widget("template_file")
                .unwrap()
                .selected(),
            Some("None")
        );
    }

    #[test]
    fn refresh_drops_a_selection_that_disappeared() {
        let mut server = mockito::Server::new();
        let _list = server
            .mock("GET", "/easyuse/get_prompt_lists")
            .with_status(200)
            .with_body(r#"["None", "b.json"]"#)
            .create();

        let (mut manager, mut graph, mut notifications, node) = setup(&server);
        select_template(&mut graph, node, "a.json");
        manager.request_refresh(node);

        assert!(pump(&mut manager, &mut graph, &mut notifications, |g, _, _| {
            g.node(node)
                .unwrap()
                .widget("template_file")
                .unwrap()
                .selected()
                == Some("None")
        }));
    }

    #[test]
    fn unconfirmed_collision_aborts_the_save() {
        let mut server = mockito::Server::new();
        let _list = server
            .mock("GET", "/easyuse/get_prompt_lists")
            .with_status(200)
            .with_body(r#"["None", "exists.json"]"#)
            .create();
        let save = server
            .mock("POST", "/easyuse/save_prompt_list")
            .expect(0)
            .create();

        let (mut manager, mut graph, mut notifications, node) = setup(&server);
        set_save_name(&mut graph, node, "exists");
        manager.request_save(&graph, node, &mut notifications);

        assert!(pump(&mut manager, &mut graph, &mut notifications, |_, _, m| {
            m.has_pending_confirm()
        }));
        manager.decline_pending();

        // Give a stray worker a moment to hit the endpoint if one existed.
        std::thread::sleep(Duration::from_millis(100));
        manager.poll(&mut graph, &mut notifications);
        save.assert();
    }

    #[test]
    fn confirmed_collision_saves_exactly_once_and_reselects() {
        let mut server = mockito::Server::new();
        let list = server
            .mock("GET", "/easyuse/get_prompt_lists")
            .with_status(200)
            .with_body(r#"["None", "exists.json"]"#)
            .expect(2)
            .create();
        let save = server
            .mock("POST", "/easyuse/save_prompt_list")
            .match_body(Matcher::Json(json!({
                "filename": "exists.json",
                "prompts": {
                    "prompt_1": "hello",
                    "prompt_2": "",
                    "prompt_3": "",
                    "prompt_4": "",
                    "prompt_5": "",
                }
            })))
            .with_status(200)
            .with_body(r#"{"status": "ok"}"#)
            .expect(1)
            .create();

        let (mut manager, mut graph, mut notifications, node) = setup(&server);
        graph
            .node_mut(node)
            .unwrap()
            .widget_mut("prompt_1")
            .unwrap()
            .set_text("hello");
        set_save_name(&mut graph, node, "exists");
        manager.request_save(&graph, node, &mut notifications);

        assert!(pump(&mut manager, &mut graph, &mut notifications, |_, _, m| {
            m.has_pending_confirm()
        }));
        manager.confirm_pending();

        // Save completes, then the follow-up refresh selects the saved name.
        assert!(pump(&mut manager, &mut graph, &mut notifications, |g, _, _| {
            g.node(node)
                .unwrap()
                .widget("template_file")
                .unwrap()
                .selected()
                == Some("exists.json")
        }));
        save.assert();
        list.assert();

        let saved = notifications
            .get_notification(&format!("template-save-{}", node))
            .unwrap();
        assert_eq!(saved.notification_type, NotificationType::Success);
    }

    #[test]
    fn collision_check_ignores_path_separator_style() {
        let mut server = mockito::Server::new();
        let _list = server
            .mock("GET", "/easyuse/get_prompt_lists")
            .with_status(200)
            .with_body(r#"["None", "sub\\name.json"]"#)
            .create();
        let save = server
            .mock("POST", "/easyuse/save_prompt_list")
            .expect(0)
            .create();

        let (mut manager, mut graph, mut notifications, node) = setup(&server);
        set_save_name(&mut graph, node, "sub/name");
        manager.request_save(&graph, node, &mut notifications);

        // "sub/name.json" collides with the listed "sub\name.json".
        assert!(pump(&mut manager, &mut graph, &mut notifications, |_, _, m| {
            m.has_pending_confirm()
        }));
        manager.decline_pending();
        std::thread::sleep(Duration::from_millis(100));
        save.assert();
    }

    #[test]
    fn fresh_name_saves_without_a_confirmation() {
        let mut server = mockito::Server::new();
        let list = server
            .mock("GET", "/easyuse/get_prompt_lists")
            .with_status(200)
            .with_body(r#"["None", "other.json"]"#)
            .expect(2)
            .create();
        let save = server
            .mock("POST", "/easyuse/save_prompt_list")
            .match_body(Matcher::PartialJson(json!({"filename": "fresh.json"})))
            .with_status(200)
            .with_body(r#"{"status": "ok"}"#)
            .expect(1)
            .create();

        let (mut manager, mut graph, mut notifications, node) = setup(&server);
        set_save_name(&mut graph, node, "fresh");
        manager.request_save(&graph, node, &mut notifications);

        // The saved name is selected even though the canned list body does
        // not carry it; reaching that state proves the refresh ran.
        assert!(pump(&mut manager, &mut graph, &mut notifications, |g, n, _| {
            n.get_notification(&format!("template-save-{}", node))
                .map(|note| note.notification_type == NotificationType::Success)
                .unwrap_or(false)
                && g.node(node)
                    .unwrap()
                    .widget("template_file")
                    .unwrap()
                    .selected()
                    == Some("fresh.json")
        }));
        assert!(!manager.has_pending_confirm());
        save.assert();
        list.assert();
    }

    #[test]
    fn loading_distributes_slots_and_adopts_the_name() {
        let mut server = mockito::Server::new();
        let _view = server
            .mock("GET", "/easyuse/view_prompt_list")
            .match_query(Matcher::UrlEncoded(
                "filename".to_string(),
                "t.json".to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"prompt_2": "b"}"#)
            .create();

        let (mut manager, mut graph, mut notifications, node) = setup(&server);
        // Stale text in a slot must be overwritten by the emptiness of the
        // fetched template.
        graph
            .node_mut(node)
            .unwrap()
            .widget_mut("prompt_5")
            .unwrap()
            .set_text("stale");
        select_template(&mut graph, node, "t.json");
        manager.request_load(&graph, node, &mut notifications);

        assert!(pump(&mut manager, &mut graph, &mut notifications, |g, _, _| {
            let n = g.node(node).unwrap();
            n.widget("prompt_2").unwrap().as_text() == Some("b")
                && n.widget("prompt_5").unwrap().as_text() == Some("")
                && n.widget("save_filename").unwrap().as_text() == Some("t.json")
        }));
    }

    #[test]
    fn empty_target_is_rejected_before_any_request() {
        let mut server = mockito::Server::new();
        let list = server
            .mock("GET", "/easyuse/get_prompt_lists")
            .expect(0)
            .create();

        let (mut manager, mut graph, mut notifications, node) = setup(&server);
        manager.request_save(&graph, node, &mut notifications);

        let note = notifications
            .get_notification(&format!("template-save-{}", node))
            .unwrap();
        assert_eq!(note.notification_type, NotificationType::Info);
        assert_eq!(note.message, "Enter a save filename first.");
        assert!(!manager.has_pending_confirm());

        std::thread::sleep(Duration::from_millis(50));
        manager.poll(&mut graph, &mut notifications);
        list.assert();
    }

    #[test]
    fn selection_is_a_valid_save_target() {
        // With an empty save box, the dropdown selection names the target.
        let mut server = mockito::Server::new();
        let _list = server
            .mock("GET", "/easyuse/get_prompt_lists")
            .with_status(200)
            .with_body(r#"["None", "sel.json"]"#)
            .create();
        let _save = server
            .mock("POST", "/easyuse/save_prompt_list")
            .match_body(Matcher::PartialJson(json!({"filename": "sel.json"})))
            .with_status(200)
            .with_body(r#"{"status": "ok"}"#)
            .create();

        let (mut manager, mut graph, mut notifications, node) = setup(&server);
        select_template(&mut graph, node, "sel.json");
        manager.request_save(&graph, node, &mut notifications);

        // The target exists, so the overwrite gate appears.
        assert!(pump(&mut manager, &mut graph, &mut notifications, |_, _, m| {
            m.has_pending_confirm()
        }));
    }

    #[test]
    fn delete_round_trip_refreshes_the_list() {
        let mut server = mockito::Server::new();
        let delete = server
            .mock("POST", "/easyuse/delete_prompt_list")
            .match_body(Matcher::Json(json!({"filename": "old.json"})))
            .with_status(200)
            .with_body(r#"{"status": "deleted"}"#)
            .expect(1)
            .create();
        let list = server
            .mock("GET", "/easyuse/get_prompt_lists")
            .with_status(200)
            .with_body(r#"["None"]"#)
            .expect(1)
            .create();

        let (mut manager, mut graph, mut notifications, node) = setup(&server);
        select_template(&mut graph, node, "old.json");
        manager.request_delete(&graph, node, &mut notifications);
        assert!(manager.has_pending_confirm());
        manager.confirm_pending();

        assert!(pump(&mut manager, &mut graph, &mut notifications, |g, n, _| {
            n.get_notification(&format!("template-delete-{}", node))
                .map(|note| note.notification_type == NotificationType::Success)
                .unwrap_or(false)
                && options_of(g, node) == vec!["None"]
        }));
        delete.assert();
        list.assert();
    }

    #[test]
    fn declined_delete_sends_nothing_and_keeps_the_selection() {
        let mut server = mockito::Server::new();
        let delete = server
            .mock("POST", "/easyuse/delete_prompt_list")
            .expect(0)
            .create();
        let list = server
            .mock("GET", "/easyuse/get_prompt_lists")
            .expect(0)
            .create();

        let (mut manager, mut graph, mut notifications, node) = setup(&server);
        select_template(&mut graph, node, "keep.json");
        manager.request_delete(&graph, node, &mut notifications);
        assert!(manager.has_pending_confirm());
        manager.decline_pending();

        // Give a stray worker a moment to hit an endpoint if one existed.
        std::thread::sleep(Duration::from_millis(100));
        manager.poll(&mut graph, &mut notifications);
        delete.assert();
        list.assert();
        assert_eq!(
            graph
                .node(node)
                .unwrap()
                .widget("template_file")
                .unwrap()
                .selected(),
            Some("keep.json")
        );
    }

    #[test]
    fn list_failure_surfaces_as_an_error_notification() {
        let mut server = mockito::Server::new();
        let _list = server
            .mock("GET", "/easyuse/get_prompt_lists")
            .with_status(500)
            .with_body("internal error")
            .create();

        let (mut manager, mut graph, mut notifications, node) = setup(&server);
        manager.request_refresh(node);

        assert!(pump(&mut manager, &mut graph, &mut notifications, |_, n, _| {
            n.has_errors()
        }));
        let note = notifications
            .get_notification(&format!("template-list-{}", node))
            .unwrap();
        assert!(note.message.contains("HTTP 500"));
    }
}
