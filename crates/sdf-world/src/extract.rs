use crate::{PlanarOffset, Result, SceneError, ScenePose};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;
use std::iter::FusedIterator;

const MODEL: &[u8] = b"model";
const POSE: &[u8] = b"pose";

/// Streams `(name, offset)` pairs out of an SDF world.
///
/// Every `<pose>` met while a named `<model>` is open yields one item, unless the
/// offset sits exactly on the origin. Only one model name is tracked: a nested
/// model overwrites it, and closing any model clears it.
///
/// The sequence is finite and cannot be restarted. It stops after the first error.
pub struct PoseExtractor<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    scope: ModelScope,
    finished: bool,
}

/// Traversal state for the model currently open.
#[derive(Debug, Default)]
struct ModelScope {
    current: Option<String>,
    /// Pose text gathered so far; `Some` only while inside a `<pose>` of a named model.
    capture: Option<String>,
}

impl<R: BufRead> PoseExtractor<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: Reader::from_reader(source),
            buf: Vec::new(),
            scope: ModelScope::default(),
            finished: false,
        }
    }

    fn next_pose(&mut self) -> Result<Option<ScenePose>> {
        loop {
            self.buf.clear();
            let position = self.reader.buffer_position();

            let emitted = match self.reader.read_event_into(&mut self.buf)? {
                Event::Eof => return Ok(None),
                Event::Start(e) => {
                    self.scope.open(&e, position)?;
                    None
                }
                Event::Empty(e) => {
                    // <model name=".."/> still has to carry a name
                    if e.local_name().as_ref() == MODEL {
                        self.scope.open(&e, position)?;
                        self.scope.close(MODEL)?;
                    }
                    None
                }
                Event::End(e) => self.scope.close(e.local_name().as_ref())?,
                Event::Text(t) => {
                    if self.scope.is_capturing() {
                        self.scope.push_text(&t.decode()?);
                    }
                    None
                }
                Event::CData(c) => {
                    if self.scope.is_capturing() {
                        self.scope.push_text(&c.decode()?);
                    }
                    None
                }
                Event::GeneralRef(r) => {
                    // References arrive separately from the text around them
                    if self.scope.is_capturing() {
                        let reference = format!("&{};", r.decode()?);
                        self.scope
                            .push_text(&quick_xml::escape::unescape(&reference)?);
                    }
                    None
                }
                _ => None,
            };

            if emitted.is_some() {
                return Ok(emitted);
            }
        }
    }
}

impl<'a> PoseExtractor<&'a [u8]> {
    /// Extract from an in-memory document.
    pub fn from_xml(xml: &'a str) -> Self {
        Self::new(xml.as_bytes())
    }
}

impl<R: BufRead> Iterator for PoseExtractor<R> {
    type Item = Result<ScenePose>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let next = self.next_pose().transpose();
        if !matches!(next, Some(Ok(_))) {
            self.finished = true;
        }
        next
    }
}

impl<R: BufRead> FusedIterator for PoseExtractor<R> {}

impl ModelScope {
    fn open(&mut self, element: &BytesStart, position: u64) -> Result<()> {
        match element.local_name().as_ref() {
            MODEL => {
                let name = model_name(element)?.ok_or(SceneError::MissingAttribute {
                    element: "model",
                    attr: "name",
                    position,
                })?;
                if name.is_empty() {
                    log::debug!("Model at byte {position} has an empty name, ignoring its poses");
                    self.current = None;
                } else {
                    log::debug!("Entering model '{name}'");
                    self.current = Some(name);
                }
            }
            POSE if self.current.is_some() => self.capture = Some(String::new()),
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, local_name: &[u8]) -> Result<Option<ScenePose>> {
        match local_name {
            MODEL => {
                self.current = None;
                Ok(None)
            }
            POSE => {
                let Some(text) = self.capture.take() else {
                    return Ok(None);
                };
                let Some(name) = self.current.as_ref() else {
                    return Ok(None);
                };
                if text.is_empty() {
                    log::debug!("Model '{name}' has an empty pose, skipping");
                    return Ok(None);
                }

                let offset = PlanarOffset::parse(&text).map_err(|reason| SceneError::Format {
                    model: name.clone(),
                    reason,
                })?;
                if offset.is_origin() {
                    log::debug!("Model '{name}' sits on the origin, skipping");
                    return Ok(None);
                }

                Ok(Some(ScenePose {
                    name: name.clone(),
                    offset,
                }))
            }
            _ => Ok(None),
        }
    }

    fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    fn push_text(&mut self, text: &str) {
        if let Some(capture) = self.capture.as_mut() {
            capture.push_str(text);
        }
    }
}

fn model_name(element: &BytesStart) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == b"name" {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(xml: &str) -> Vec<String> {
        PoseExtractor::from_xml(xml)
            .map(|pose| pose.unwrap().name)
            .collect()
    }

    #[test]
    fn extracts_named_model_poses() {
        let xml = r#"<sdf version="1.6">
  <world name="default">
    <model name="rover1">
      <pose>10 0 0 0 0 0</pose>
    </model>
    <model name="gate">
      <pose>-4.5 12.25 1 0 0 0.7</pose>
    </model>
  </world>
</sdf>"#;

        let poses = PoseExtractor::from_xml(xml)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(
            poses,
            vec![
                ScenePose {
                    name: "rover1".to_string(),
                    offset: PlanarOffset::new(10.0, 0.0),
                },
                ScenePose {
                    name: "gate".to_string(),
                    offset: PlanarOffset::new(-4.5, 12.25),
                },
            ]
        );
    }

    #[test]
    fn skips_origin_model() {
        let xml = r#"<world><model name="iris"><pose>0 0 0 0 0 0</pose></model></world>"#;
        assert!(names(xml).is_empty());
    }

    #[test]
    fn origin_skip_only_needs_planar_zero() {
        let xml = r#"<world><model name="iris"><pose>0 0 0.19 0 0 3.14</pose></model></world>"#;
        assert!(names(xml).is_empty());
    }

    #[test]
    fn ignores_poses_outside_models() {
        let xml = r#"<world>
  <light name="sun"><pose>0 0 10 0 0 0</pose></light>
  <camera><pose>5 5 5 0 0 0</pose></camera>
  <model name="box"><pose>1 2 0 0 0 0</pose></model>
</world>"#;
        assert_eq!(names(xml), vec!["box"]);
    }

    #[test]
    fn link_poses_inside_a_model_are_reported_too() {
        let xml = r#"<world>
  <model name="runway">
    <pose>3 4 0 0 0 0</pose>
    <link name="base"><pose>0 0 0 0 0 0</pose></link>
    <link name="sign"><pose>1 0 0 0 0 0</pose></link>
  </model>
</world>"#;
        assert_eq!(names(xml), vec!["runway", "runway"]);
    }

    #[test]
    fn nested_model_overwrites_then_clears_name() {
        let xml = r#"<world>
  <model name="outer">
    <model name="inner"><pose>1 1 0 0 0 0</pose></model>
    <pose>2 2 0 0 0 0</pose>
  </model>
  <model name="after"><pose>3 3 0 0 0 0</pose></model>
</world>"#;
        assert_eq!(names(xml), vec!["inner", "after"]);
    }

    #[test]
    fn empty_model_name_captures_nothing() {
        let xml = r#"<world>
  <model name=""><pose>5 5 0 0 0 0</pose></model>
  <model name="named">
    <model name=""><pose>6 6 0 0 0 0</pose></model>
    <pose>7 7 0 0 0 0</pose>
  </model>
  <model name="last"><pose>8 8 0 0 0 0</pose></model>
</world>"#;
        assert_eq!(names(xml), vec!["last"]);
    }

    #[test]
    fn missing_name_attribute_aborts() {
        let xml = r#"<world>
  <model name="first"><pose>1 0 0 0 0 0</pose></model>
  <model><pose>2 0 0 0 0 0</pose></model>
  <model name="never"><pose>3 0 0 0 0 0</pose></model>
</world>"#;

        let mut extractor = PoseExtractor::from_xml(xml);
        assert_eq!(extractor.next().unwrap().unwrap().name, "first");
        assert!(matches!(
            extractor.next(),
            Some(Err(SceneError::MissingAttribute {
                element: "model",
                attr: "name",
                ..
            }))
        ));
        assert!(extractor.next().is_none());
    }

    #[test]
    fn self_closing_model_still_needs_a_name() {
        let result: Result<Vec<_>> = PoseExtractor::from_xml("<world><model/></world>").collect();
        assert!(matches!(
            result,
            Err(SceneError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn malformed_pose_is_a_format_error() {
        let xml = r#"<world><model name="tower"><pose>40.0</pose></model></world>"#;
        let err = PoseExtractor::from_xml(xml).next().unwrap().unwrap_err();
        match err {
            SceneError::Format { model, reason } => {
                assert_eq!(model, "tower");
                assert_eq!(reason, crate::PoseFormatError::TooFewFields(1));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_pose_element_emits_nothing() {
        let xml = r#"<world>
  <model name="a"><pose/></model>
  <model name="b"><pose></pose></model>
</world>"#;
        assert!(names(xml).is_empty());
    }

    #[test]
    fn text_split_by_references_is_reassembled() {
        let xml = r#"<world><model name="R&amp;D"><pose>1&#32;2 0 0 0 0</pose></model></world>"#;
        let poses = PoseExtractor::from_xml(xml)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(poses.len(), 1);
        assert_eq!(poses[0].name, "R&D");
        assert_eq!(poses[0].offset, PlanarOffset::new(1.0, 2.0));
    }

    #[test]
    fn cdata_pose_text_is_accepted() {
        let xml = r#"<world><model name="c"><pose><![CDATA[7 8 0 0 0 0]]></pose></model></world>"#;
        assert_eq!(names(xml), vec!["c"]);
    }

    #[test]
    fn namespaced_elements_match_on_local_name() {
        let xml = r#"<s:world xmlns:s="urn:sdf"><s:model name="ns"><s:pose>1 1</s:pose></s:model></s:world>"#;
        assert_eq!(names(xml), vec!["ns"]);
    }

    #[test]
    fn malformed_xml_is_reported() {
        let xml = r#"<world><model name="x"><pose>1 1</model></world>"#;
        let result: Result<Vec<_>> = PoseExtractor::from_xml(xml).collect();
        assert!(matches!(result, Err(SceneError::Xml(_))));
    }
}
