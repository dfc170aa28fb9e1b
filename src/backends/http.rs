// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! JSON-over-HTTP capability backend.
//!
//! One client serves every model-backed capability against a single model
//! server. Each capability is a `POST {endpoint}/<route>`; images travel as
//! base64-encoded PNG and boxes as `[x1, y1, x2, y2]` pixel arrays.
//!
//! | Route       | Request                                  | Response                                    |
//! |-------------|------------------------------------------|---------------------------------------------|
//! | `/vqa`      | `{image, question}`                      | `{answer}`                                  |
//! | `/detect`   | `{image, object}`                        | `{detections: [{box, label, score}]}`       |
//! | `/segment`  | `{image}`                                | `{segments: [{box, label, mask}]}`          |
//! | `/classify` | `{images, labels}`                       | `{results: [{label, score, scores}]}`       |
//! | `/inpaint`  | `{image, mask, prompt}`                  | `{image}`                                   |
//! | `/faces`    | `{image}`                                | `{faces: [box]}`                            |
//! | `/list`     | `{query, max}`                           | `{items}`                                   |

use anyhow::{bail, Context};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::errors::ConfigError;
use crate::observability::messages::capability::{CapabilityCallCompleted, CapabilityCallFailed};
use crate::observability::messages::StructuredLog;
use crate::traits::capability::{
    CLASSIFIER, FACE_DETECTOR, INPAINTER, LIST_GENERATOR, OBJECT_DETECTOR, SEGMENTER, VISUAL_QA,
};
use crate::traits::{
    Classification, Classifier, Detection, FaceDetector, Inpainter, ListGenerator, ObjectDetector, Segment,
    Segmenter, VisualQa,
};
use crate::utils::imaging::encode_png;
use crate::value::{Mask, RasterImage, Rect};

const BACKEND: &str = "http";

pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpBackend {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::Backend {
                backend: BACKEND,
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post<Req, Resp>(&self, capability: &str, route: &str, body: &Req) -> anyhow::Result<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let started = Instant::now();
        let result = self.send(route, body).await;
        match &result {
            Ok(_) => CapabilityCallCompleted {
                capability,
                backend: BACKEND,
                duration: started.elapsed(),
            }
            .log(),
            Err(e) => CapabilityCallFailed {
                capability,
                backend: BACKEND,
                error: e.as_ref(),
            }
            .log(),
        }
        result
    }

    async fn send<Req, Resp>(&self, route: &str, body: &Req) -> anyhow::Result<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{}", self.endpoint, route);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("POST {} returned {}: {}", url, status, text);
        }
        response
            .json::<Resp>()
            .await
            .with_context(|| format!("POST {} returned an undecodable body", url))
    }
}

fn encode_image(image: &RasterImage) -> anyhow::Result<String> {
    Ok(STANDARD.encode(encode_png(image)?))
}

fn encode_mask(mask: &Mask) -> anyhow::Result<String> {
    let image = RasterImage::new(DynamicImage::ImageLuma8((*mask.0).clone()));
    encode_image(&image)
}

fn decode_image(data: &str) -> anyhow::Result<RasterImage> {
    let bytes = STANDARD.decode(data).context("image is not valid base64")?;
    let image = image::load_from_memory(&bytes).context("image is not a decodable raster")?;
    Ok(RasterImage::new(image))
}

/// Model servers report float boxes; negative coordinates clamp to zero.
fn wire_rect(b: [f32; 4]) -> Rect {
    let px = |v: f32| v.max(0.0).round() as u32;
    Rect::new(px(b[0]), px(b[1]), px(b[2]), px(b[3]))
}

#[derive(Serialize)]
struct VqaRequest<'a> {
    image: String,
    question: &'a str,
}

#[derive(Deserialize)]
struct VqaResponse {
    answer: String,
}

#[derive(Serialize)]
struct DetectRequest<'a> {
    image: String,
    object: &'a str,
}

#[derive(Deserialize)]
struct WireDetection {
    #[serde(rename = "box")]
    rect: [f32; 4],
    #[serde(default)]
    label: String,
    score: f32,
}

#[derive(Deserialize)]
struct DetectResponse {
    detections: Vec<WireDetection>,
}

#[derive(Serialize)]
struct ImageRequest {
    image: String,
}

#[derive(Deserialize)]
struct WireSegment {
    #[serde(rename = "box")]
    rect: [f32; 4],
    label: String,
    mask: String,
}

#[derive(Deserialize)]
struct SegmentResponse {
    segments: Vec<WireSegment>,
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    images: Vec<String>,
    labels: &'a [String],
}

#[derive(Deserialize)]
struct WireClassification {
    label: String,
    score: f32,
    #[serde(default)]
    scores: Vec<f32>,
}

#[derive(Deserialize)]
struct ClassifyResponse {
    results: Vec<WireClassification>,
}

#[derive(Serialize)]
struct InpaintRequest<'a> {
    image: String,
    mask: String,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct ImageResponse {
    image: String,
}

#[derive(Deserialize)]
struct FacesResponse {
    faces: Vec<[f32; 4]>,
}

#[derive(Serialize)]
struct ListRequest<'a> {
    query: &'a str,
    max: usize,
}

#[derive(Deserialize)]
struct ListResponse {
    items: Vec<String>,
}

#[async_trait]
impl VisualQa for HttpBackend {
    async fn answer(&self, image: &RasterImage, question: &str) -> anyhow::Result<String> {
        let body = VqaRequest {
            image: encode_image(image)?,
            question,
        };
        let response: VqaResponse = self.post(VISUAL_QA, "vqa", &body).await?;
        Ok(response.answer)
    }
}

#[async_trait]
impl ObjectDetector for HttpBackend {
    async fn detect(&self, image: &RasterImage, object: &str) -> anyhow::Result<Vec<Detection>> {
        let body = DetectRequest {
            image: encode_image(image)?,
            object,
        };
        let response: DetectResponse = self.post(OBJECT_DETECTOR, "detect", &body).await?;
        Ok(response
            .detections
            .into_iter()
            .map(|d| Detection {
                rect: wire_rect(d.rect),
                label: d.label,
                score: d.score,
            })
            .collect())
    }
}

#[async_trait]
impl Segmenter for HttpBackend {
    async fn segment(&self, image: &RasterImage) -> anyhow::Result<Vec<Segment>> {
        let body = ImageRequest {
            image: encode_image(image)?,
        };
        let response: SegmentResponse = self.post(SEGMENTER, "segment", &body).await?;
        response
            .segments
            .into_iter()
            .map(|s| {
                let mask = decode_image(&s.mask)?.as_image().to_luma8();
                Ok(Segment {
                    mask: Mask::new(mask),
                    label: s.label,
                    rect: wire_rect(s.rect),
                })
            })
            .collect()
    }
}

#[async_trait]
impl Classifier for HttpBackend {
    async fn classify(&self, crops: &[RasterImage], labels: &[String]) -> anyhow::Result<Vec<Classification>> {
        let images = crops.iter().map(encode_image).collect::<anyhow::Result<Vec<_>>>()?;
        let body = ClassifyRequest { images, labels };
        let response: ClassifyResponse = self.post(CLASSIFIER, "classify", &body).await?;
        if response.results.len() != crops.len() {
            bail!(
                "classifier returned {} results for {} crops",
                response.results.len(),
                crops.len()
            );
        }
        Ok(response
            .results
            .into_iter()
            .map(|c| Classification {
                label: c.label,
                score: c.score,
                scores: c.scores,
            })
            .collect())
    }
}

#[async_trait]
impl Inpainter for HttpBackend {
    async fn inpaint(&self, image: &RasterImage, mask: &Mask, prompt: &str) -> anyhow::Result<RasterImage> {
        let body = InpaintRequest {
            image: encode_image(image)?,
            mask: encode_mask(mask)?,
            prompt,
        };
        let response: ImageResponse = self.post(INPAINTER, "inpaint", &body).await?;
        decode_image(&response.image)
    }
}

#[async_trait]
impl FaceDetector for HttpBackend {
    async fn detect_faces(&self, image: &RasterImage) -> anyhow::Result<Vec<Rect>> {
        let body = ImageRequest {
            image: encode_image(image)?,
        };
        let response: FacesResponse = self.post(FACE_DETECTOR, "faces", &body).await?;
        Ok(response.faces.into_iter().map(wire_rect).collect())
    }
}

#[async_trait]
impl ListGenerator for HttpBackend {
    async fn generate(&self, query: &str, max: usize) -> anyhow::Result<Vec<String>> {
        let body = ListRequest { query, max };
        let response: ListResponse = self.post(LIST_GENERATOR, "list", &body).await?;
        Ok(response.items)
    }
}
