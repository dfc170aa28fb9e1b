use std::sync::Arc;

use crate::backends::stub::{
    stub_capabilities, StubClassifier, StubDetector, StubFaceDetector, StubListGenerator, StubSegmenter, StubVqa,
};
use crate::config::build_registry;
use crate::engine::SequentialExecutor;
use crate::errors::InterpreterError;
use crate::state::StateEnv;
use crate::traits::{Capabilities, ProgramExecutor, Segment};
use crate::value::{Mask, Rect, Value};

/// End-to-end program runs through the registry and the sequential executor
#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn executor(profile: &str, caps: Capabilities) -> SequentialExecutor {
        let registry = build_registry(profile, &caps, None).expect("registry builds");
        SequentialExecutor::new(Arc::new(registry))
    }

    fn image(w: u32, h: u32) -> Value {
        Value::image(DynamicImage::new_rgb8(w, h))
    }

    fn two_cats() -> Capabilities {
        stub_capabilities().with_object_detector(Arc::new(StubDetector::new(vec![
            Rect::new(0, 0, 10, 10),
            Rect::new(20, 20, 40, 40),
        ])))
    }

    const CAT_PROGRAM: &str = r#"
A=FIND(image=LEFT,object="cat")
B=COUNT(region=A)
C=EXISTS(region=B)
D=RESULT(var=C)
"#;

    #[tokio::test]
    async fn test_find_count_exists_result() {
        let executor = executor("nlvr", two_cats());
        let state = StateEnv::new().with("LEFT", image(100, 100));

        let (value, state) = executor.run(CAT_PROGRAM, state).await.unwrap();

        assert_eq!(value, Value::from(true));
        assert_eq!(state.get("A").and_then(Value::as_regions).map(|r| r.len()), Some(2));
        assert_eq!(state.get("B"), Some(&Value::from(2i64)));
        assert_eq!(state.get("C"), Some(&Value::from(true)));
        assert_eq!(state.get("D"), Some(&Value::from(true)));
    }

    #[tokio::test]
    async fn test_trace_has_one_fragment_per_step() {
        let executor = executor("nlvr", two_cats());
        let mut state = StateEnv::new().with("LEFT", image(100, 100));

        let output = executor.execute(CAT_PROGRAM, &mut state, true).await.unwrap();

        let trace = output.trace.expect("inspect produces a trace");
        assert_eq!(trace.len(), 4);
        let order: Vec<(usize, &str)> = trace
            .fragments()
            .iter()
            .map(|f| (f.index, f.output_var.as_str()))
            .collect();
        assert_eq!(order, vec![(0, "A"), (1, "B"), (2, "C"), (3, "D")]);
        assert_eq!(trace.fragments()[3].to_string(), "D=RESULT(var=C)=true");

        let untraced = executor.execute(CAT_PROGRAM, &mut state, false).await.unwrap();
        assert!(untraced.trace.is_none());
    }

    #[tokio::test]
    async fn test_lazy_load_is_memoized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("left.png");
        RgbImage::new(64, 48).save(&path).unwrap();

        let executor = executor("nlvr", two_cats());
        let mut state = StateEnv::new();
        state.bind_path("LEFT", &path);

        executor
            .execute("A=FIND(image=LEFT,object='cat')", &mut state, false)
            .await
            .unwrap();
        assert!(matches!(state.get("LEFT"), Some(Value::Image(img)) if img.width() == 64));

        // the file is gone; the second step must reuse the loaded image
        std::fs::remove_file(&path).unwrap();
        let output = executor
            .execute("B=VQA(image=LEFT,question='Is there a cat?')", &mut state, false)
            .await
            .unwrap();
        assert_eq!(output.value, Value::from("yes"));
    }

    #[tokio::test]
    async fn test_nested_find_reports_base_frame_coordinates() {
        let caps = stub_capabilities()
            .with_object_detector(Arc::new(StubDetector::new(vec![Rect::new(10, 10, 50, 50)])));
        let executor = executor("nlvr", caps);
        let mut state = StateEnv::new().with("IMAGE", image(100, 100));

        let output = executor
            .execute("BOX0=FIND(image=IMAGE,object='face')\nBOX1=FIND(image=BOX0,object='eye')", &mut state, false)
            .await
            .unwrap();

        // the crop is 40x40, so the repeated box is clamped to (10,10,40,40) before translation
        let regions = output.value.as_regions().unwrap();
        assert_eq!(regions[0].rect, Rect::new(20, 20, 50, 50));
        assert_eq!(regions[0].source.as_deref(), Some("IMAGE"));
    }

    #[tokio::test]
    async fn test_eval_over_vqa_answers() {
        let caps = stub_capabilities().with_visual_qa(Arc::new(StubVqa::new(["yes", "no"])));
        let executor = executor("nlvr", caps);
        let state = StateEnv::new().with("LEFT", image(8, 8)).with("RIGHT", image(8, 8));
        let program = r#"
ANSWER0=VQA(image=LEFT,question="Is there a dog?")
ANSWER1=VQA(image=RIGHT,question="Is there a dog?")
ANSWER2=EVAL(expr="{ANSWER0} and not {ANSWER1}")
FINAL_ANSWER=RESULT(var=ANSWER2)
"#;
        let (value, _) = executor.run(program, state).await.unwrap();
        assert_eq!(value, Value::from(true));
    }

    #[tokio::test]
    async fn test_gqa_loc_crop_vqa() {
        let caps = stub_capabilities()
            .with_object_detector(Arc::new(StubDetector::new(vec![Rect::new(20, 20, 40, 40)])))
            .with_visual_qa(Arc::new(StubVqa::new(["lamp"])));
        let executor = executor("gqa", caps);
        let program = r#"
BOX0=LOC(image=IMAGE,object='table')
IMAGE0=CROP_RIGHTOF(image=IMAGE,box=BOX0)
ANSWER0=VQA(image=IMAGE0,question='What is right of the table?')
FINAL_RESULT=RESULT(var=ANSWER0)
"#;
        let (value, state) = executor.run(program, StateEnv::new().with("IMAGE", image(100, 60))).await.unwrap();
        assert_eq!(value, Value::from("lamp"));
        assert!(matches!(state.get("IMAGE0"), Some(Value::Image(img)) if img.width() == 70 && img.height() == 60));
    }

    #[tokio::test]
    async fn test_image_edit_seg_select_colorpop() {
        let dog = Segment {
            mask: Mask::from_rect(&Rect::new(0, 0, 8, 8), 16, 16),
            label: "dog".to_string(),
            rect: Rect::new(0, 0, 8, 8),
        };
        let classifier = Arc::new(StubClassifier::new());
        let caps = stub_capabilities()
            .with_segmenter(Arc::new(StubSegmenter::new(vec![dog])))
            .with_classifier(classifier.clone());
        let executor = executor("imageEdit", caps);
        let program = r#"
OBJ0=SEG(image=IMAGE)
OBJ1=SELECT(image=IMAGE,object=OBJ0,query='dog',category=None)
IMAGE0=COLORPOP(image=IMAGE,object=OBJ1)
FINAL_RESULT=RESULT(var=IMAGE0)
"#;
        let (value, state) = executor.run(program, StateEnv::new().with("IMAGE", image(16, 16))).await.unwrap();
        assert!(matches!(value, Value::Image(_)));
        assert_eq!(state.get("OBJ1").and_then(Value::as_regions).map(|r| r.len()), Some(1));
        // matched by name, so the classifier was never asked
        assert_eq!(classifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_okdet_facedet_list_classify_tag() {
        let caps = stub_capabilities()
            .with_face_detector(Arc::new(StubFaceDetector::new(vec![
                Rect::new(10, 10, 20, 20),
                Rect::new(40, 10, 50, 20),
            ])))
            .with_list_generator(Arc::new(StubListGenerator::new(["Ann", "Ben", "Cy"])))
            .with_classifier(Arc::new(StubClassifier::with_scores(vec![vec![0.9, 0.1], vec![0.2, 0.7]])));
        let executor = executor("okDet", caps);
        let program = r#"
OBJ0=FACEDET(image=IMAGE)
LIST0=LIST(query='friends',max=2)
OBJ1=CLASSIFY(image=IMAGE,object=OBJ0,categories=LIST0)
IMAGE0=TAG(image=IMAGE,object=OBJ1)
FINAL_RESULT=RESULT(var=IMAGE0)
"#;
        let (value, state) = executor.run(program, StateEnv::new().with("IMAGE", image(64, 32))).await.unwrap();
        assert!(matches!(value, Value::Image(_)));
        let classes: Vec<Option<String>> = state
            .get("OBJ1")
            .and_then(Value::as_regions)
            .unwrap()
            .iter()
            .map(|r| r.class.clone())
            .collect();
        assert_eq!(classes, vec![Some("Ann".to_string()), Some("Ben".to_string())]);
    }

    #[tokio::test]
    async fn test_unknown_opcode_aborts_and_keeps_earlier_bindings() {
        let executor = executor("nlvr", two_cats());
        let mut state = StateEnv::new().with("LEFT", image(100, 100));
        let program = "A=FIND(image=LEFT,object='cat')\nB=LOC(image=LEFT,object='cat')\nC=COUNT(region=A)";

        let err = executor.execute(program, &mut state, false).await.unwrap_err();

        assert!(matches!(err, InterpreterError::UnknownOpcode { ref opcode, ref profile } if opcode == "LOC" && profile == "nlvr"));
        assert!(state.contains("A"));
        assert!(!state.contains("B"));
        assert!(!state.contains("C"));
    }

    #[tokio::test]
    async fn test_malformed_line_and_empty_program() {
        let executor = executor("nlvr", two_cats());
        let mut state = StateEnv::new();

        let err = executor.execute("v = 5", &mut state, false).await.unwrap_err();
        assert!(matches!(err, InterpreterError::Parse { .. }));

        let err = executor.execute("\n   \n", &mut state, false).await.unwrap_err();
        assert!(matches!(err, InterpreterError::EmptyProgram));
    }

    #[test]
    fn test_unknown_profile() {
        let err = build_registry("vqa2", &stub_capabilities(), None).unwrap_err();
        assert!(matches!(err, InterpreterError::UnknownProfile(_)));
    }
}
